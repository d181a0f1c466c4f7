//! Shared data model: identifiers, RDF terms and result sets, identities,
//! token claims and wire envelopes.

pub mod id;
pub mod identity;
pub mod notification;
pub mod pattern;
pub mod rdf;
pub mod response;
pub mod token;

pub use id::{GateId, SubscriptionId};
pub use identity::{Credentials, DigitalIdentity, IdentityClass};
pub use notification::Notification;
pub use pattern::SparqlPattern;
pub use rdf::{Binding, RdfTerm, ResultDiff, ResultSet};
pub use response::{ErrorResponse, JwtResponse, RegistrationResponse};
pub use token::{Claims, Token};
