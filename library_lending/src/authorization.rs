use std::collections::HashSet;

use crate::api::CallerId;
use crate::error::LibraryError;

/// Decides who may change the catalog. How callers prove their identity is up to the transport.
pub trait Authorizer: Send + Sync {
    fn is_librarian(&self, caller_id: &str) -> bool;
}

/// Set of identities holding the librarian role
pub struct LibrarianRoster {
    librarians: parking_lot::RwLock<HashSet<CallerId>>,
}

impl LibrarianRoster {
    pub fn new<I, S>(librarians: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CallerId>,
    {
        let librarians = librarians.into_iter().map(Into::into).collect();
        Self {
            librarians: parking_lot::RwLock::new(librarians),
        }
    }

    pub fn librarians(&self) -> Vec<CallerId> {
        let mut librarians: Vec<_> = self.librarians.read().iter().cloned().collect();
        librarians.sort();
        librarians
    }

    /// Grants the role to `new_librarian` on behalf of an existing librarian
    pub fn appoint(&self, appointed_by: &str, new_librarian: &str) -> Result<(), LibraryError> {
        let mut librarians = self.librarians.write();
        if !librarians.contains(appointed_by) {
            return Err(LibraryError::Unauthorized(appointed_by.to_string()));
        }
        librarians.insert(new_librarian.to_string());
        tracing::info!("{} appointed {} as librarian", appointed_by, new_librarian);
        Ok(())
    }

    /// Hands the role of `from` over to `to`
    pub fn transfer(&self, from: &str, to: &str) -> Result<(), LibraryError> {
        let mut librarians = self.librarians.write();
        if !librarians.remove(from) {
            return Err(LibraryError::Unauthorized(from.to_string()));
        }
        librarians.insert(to.to_string());
        tracing::info!("Librarian role transferred from {} to {}", from, to);
        Ok(())
    }

    /// Revokes the role of `dismissed`. The roster is never left empty.
    pub fn dismiss(&self, dismissed_by: &str, dismissed: &str) -> Result<bool, LibraryError> {
        let mut librarians = self.librarians.write();
        if !librarians.contains(dismissed_by) {
            return Err(LibraryError::Unauthorized(dismissed_by.to_string()));
        }
        if librarians.len() == 1 && librarians.contains(dismissed) {
            return Err(LibraryError::LastLibrarian(dismissed.to_string()));
        }
        let removed = librarians.remove(dismissed);
        if removed {
            tracing::info!("{} dismissed librarian {}", dismissed_by, dismissed);
        }
        Ok(removed)
    }
}

impl Authorizer for LibrarianRoster {
    fn is_librarian(&self, caller_id: &str) -> bool {
        self.librarians.read().contains(caller_id)
    }
}

#[cfg(test)]
mod librarian_roster_tests {
    use super::*;

    #[test]
    /// 1. Only seeded identities are librarians
    /// 2. A librarian appoints a second one, a patron cannot
    /// 3. Role transfer moves the role
    fn test_role_management() {
        let roster = LibrarianRoster::new(["alice"]);
        assert!(roster.is_librarian("alice"));
        assert!(!roster.is_librarian("bob"));

        assert!(matches!(
            roster.appoint("bob", "bob"),
            Err(LibraryError::Unauthorized(..))
        ));
        roster.appoint("alice", "carol").unwrap();
        assert_eq!(roster.librarians(), vec!["alice", "carol"]);

        roster.transfer("carol", "dave").unwrap();
        assert!(!roster.is_librarian("carol"));
        assert!(roster.is_librarian("dave"));

        assert!(matches!(
            roster.transfer("carol", "erin"),
            Err(LibraryError::Unauthorized(..))
        ));
        assert!(!roster.is_librarian("erin"));
    }

    #[test]
    fn test_dismissal_keeps_one_librarian() {
        let roster = LibrarianRoster::new(["alice", "bob"]);

        assert!(matches!(
            roster.dismiss("mallory", "alice"),
            Err(LibraryError::Unauthorized(..))
        ));
        assert!(roster.dismiss("alice", "bob").unwrap());
        assert!(!roster.dismiss("alice", "bob").unwrap());

        assert!(matches!(
            roster.dismiss("alice", "alice"),
            Err(LibraryError::LastLibrarian(..))
        ));
        assert!(roster.is_librarian("alice"));
    }
}
