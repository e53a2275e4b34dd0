/// Hands out human-readable names that are unique among the names currently in use.
pub trait NameAllocator: Send + Sync {
    fn allocate(&self) -> String;

    /// Makes `name` available again. Releasing an unknown name is a no-op.
    fn release(&self, name: &str);
}
