use std::fmt;

/// What the observer noticed between two polls.
///
/// The scheduler only cares about the kind, so there is no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    TrackChanged,
    Paused,
    Resumed,
}

impl fmt::Display for PlaybackEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaybackEvent::TrackChanged => "track changed",
            PlaybackEvent::Paused => "paused",
            PlaybackEvent::Resumed => "resumed",
        };
        f.write_str(name)
    }
}
