pub mod account;
pub mod content;
pub mod lenient;
pub mod watch;

pub use account::{
    LoginRequest, Liker, Profile, RegisterRequest, Session, User, UserResponse,
    DEFAULT_PROFILE_NAME,
};
pub use content::{
    BrowseQuery, Content, ContentInput, ContentKind, Episode, EpisodeInput, GenreSort, PlayerQuery,
};
pub use watch::{
    EpisodeRef, ProgressQuery, ProgressReport, WatchKey, WatchRecord, WatchedEntry,
    COMPLETION_THRESHOLD,
};
