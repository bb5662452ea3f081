pub mod ace;
pub mod acl;
pub mod error;
pub mod store;

pub use ace::{Ace, AceKind, SPECIAL_PRINCIPALS};
pub use acl::{classify_and_convert, Acl, Decision};
pub use error::{AclError, Result};
pub use store::{AclStore, Nfs4AclStore};
