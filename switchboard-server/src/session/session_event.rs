use switchboard_core::Signal;

/// A trickled ICE candidate in browser `RTCIceCandidateInit` shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IceCandidate {
    pub candidate: String,
    pub sdp_mid: Option<String>,
    pub sdp_m_line_index: Option<u16>,
}

impl IceCandidate {
    /// Extracts the candidate fields of a `candidate` signal.
    pub fn from_signal(signal: &Signal) -> Option<Self> {
        Some(Self {
            candidate: signal.candidate.clone()?,
            sdp_mid: signal.sdp_mid.clone(),
            sdp_m_line_index: signal.sdp_m_line_index,
        })
    }

    pub fn into_signal(self) -> Signal {
        Signal::candidate(self.candidate, self.sdp_mid, self.sdp_m_line_index)
    }
}

/// Events a media session raises for one of its peers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session wants to renegotiate and produced a local offer.
    Offer(String),

    /// A local ICE candidate was gathered and must reach the browser.
    IceCandidate(IceCandidate),
}
