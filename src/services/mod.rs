pub mod documents;
pub mod firebase;
pub mod geocode;
pub mod rate_limit;
pub mod sessions;

pub use documents::{DocumentError, DocumentService, UploadedDocument};
pub use firebase::{
    FirebaseAuthVerifier, FirebaseError, GoogleTokenMinter, ServiceAccount, VerifiedPhoneToken,
};
pub use geocode::{AddressSource, GeocodeError, GeocodeService, ReverseGeocodeResult};
pub use rate_limit::{RateLimitError, RateLimitOptions, RateLimitResult, RateLimitService};
pub use sessions::{
    CreatedSession, SessionError, SessionPayload, SessionService, SESSION_TTL_SECONDS,
};
