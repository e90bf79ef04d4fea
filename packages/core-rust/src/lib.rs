//! `TenantGate` Core — tenant model, resolution policy, and request identification.

pub mod claims;
pub mod identify;
pub mod policy;
pub mod traits;
pub mod types;

pub use claims::TokenClaims;
pub use identify::{identify, Identification};
pub use policy::{IdentificationStrategy, PolicyError, ResolutionPolicy};
pub use traits::TenantDirectory;
pub use types::{InvalidTenantId, IsolationStrategy, TenantContext, TenantId};
