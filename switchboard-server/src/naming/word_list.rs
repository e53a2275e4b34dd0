use crate::naming::NameAllocator;
use dashmap::DashSet;
use rand::Rng;
use rand::seq::SliceRandom;

const COLORS: &[&str] = &[
    "amber", "aqua", "azure", "beige", "black", "blue", "bronze", "cherry", "coral", "crimson",
    "cyan", "emerald", "fuchsia", "golden", "gray", "green", "indigo", "ivory", "jade", "lavender",
    "lime", "magenta", "maroon", "navy", "olive", "orange", "pearl", "pink", "plum", "purple",
    "red", "rose", "ruby", "saffron", "salmon", "scarlet", "silver", "tan", "teal", "turquoise",
    "violet", "white", "yellow",
];

const CITIES: &[&str] = &[
    "amsterdam", "athens", "barcelona", "berlin", "brussels", "budapest", "copenhagen", "dublin",
    "edinburgh", "florence", "geneva", "helsinki", "istanbul", "lisbon", "london", "madrid",
    "milan", "munich", "kyiv", "oslo", "paris", "porto", "prague", "rome", "stockholm", "vienna",
    "venice", "warsaw", "zagreb", "zurich", "bangkok", "beijing", "buenos_aires", "cape_town",
    "chicago", "dubai", "hanoi", "hong_kong", "jakarta", "kathmandu", "lagos", "melbourne",
    "montreal", "mumbai", "nairobi", "new_york", "rio", "santiago", "seoul", "singapore",
    "sydney", "tokyo", "toronto", "vancouver",
];

const ADJECTIVES: &[&str] = &[
    "brave", "calm", "clever", "cosmic", "curious", "daring", "eager", "fuzzy", "gentle", "happy",
    "jolly", "keen", "lucky", "mellow", "nimble", "plucky", "quiet", "rapid", "shiny", "sleepy",
    "snappy", "sunny", "swift", "tiny", "witty", "zesty",
];

const ANIMALS: &[&str] = &[
    "badger", "beaver", "bison", "cheetah", "crane", "dolphin", "falcon", "ferret", "gecko",
    "heron", "ibex", "jaguar", "koala", "lemur", "lynx", "marmot", "narwhal", "otter", "panda",
    "puffin", "quokka", "raven", "seal", "tapir", "walrus", "yak",
];

/// After this many collisions a numeric suffix is appended, so allocation terminates
/// even when every word pair is taken.
const MAX_PLAIN_ATTEMPTS: usize = 64;

/// Names of the form `<first>-<second>`, e.g. `paris-crimson` or `swift-otter`.
pub struct WordListAllocator {
    first: &'static [&'static str],
    second: &'static [&'static str],
    in_use: DashSet<String>,
}

impl WordListAllocator {
    pub fn new(first: &'static [&'static str], second: &'static [&'static str]) -> Self {
        Self {
            first,
            second,
            in_use: DashSet::new(),
        }
    }

    /// `city-color` room names.
    pub fn rooms() -> Self {
        Self::new(CITIES, COLORS)
    }

    /// `adjective-animal` peer nicknames.
    pub fn peers() -> Self {
        Self::new(ADJECTIVES, ANIMALS)
    }

    pub fn in_use(&self) -> usize {
        self.in_use.len()
    }

    fn candidate(&self, rng: &mut impl Rng, attempt: usize) -> String {
        let first = self.first.choose(rng).copied().unwrap_or("peer");
        let second = self.second.choose(rng).copied().unwrap_or("anon");
        if attempt < MAX_PLAIN_ATTEMPTS {
            format!("{first}-{second}")
        } else {
            format!("{first}-{second}-{}", rng.gen_range(0..10_000u32))
        }
    }
}

impl NameAllocator for WordListAllocator {
    fn allocate(&self) -> String {
        let mut rng = rand::thread_rng();
        let mut attempt = 0;
        loop {
            let name = self.candidate(&mut rng, attempt);
            if self.in_use.insert(name.clone()) {
                return name;
            }
            attempt += 1;
        }
    }

    fn release(&self, name: &str) {
        self.in_use.remove(name);
    }
}
