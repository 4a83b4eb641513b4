pub mod auth;
pub mod cli;
pub mod error;
pub mod play;
pub mod publish;
pub mod util;

pub use auth::Credentials;
pub use error::{AuthError, REAUTHORIZE_MESSAGE, is_token_refresh};
pub use play::{Config, PlayPublisherClient};
pub use publish::{EditsApi, INTERNAL_TRACK, PublishRequest, publish_to_internal_track};
pub use util::{MediaTypes, format_releases};
