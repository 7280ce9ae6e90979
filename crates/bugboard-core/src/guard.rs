//! Instance-level authorship check, run after the record has been loaded.

use crate::{
  Error, Result,
  identity::Identity,
  policy::ObjectCheck,
  record::Owned,
};

/// Decide whether `identity` may apply a mutating action to `resource`.
///
/// The owner always passes. Administrators pass only under
/// [`ObjectCheck::AuthorOrAdmin`].
pub fn check<R: Owned>(
  check: ObjectCheck,
  resource: &R,
  identity: &Identity,
) -> Result<()> {
  let principal = identity.principal().ok_or(Error::Unauthenticated)?;

  if resource.owner_id() == principal.user_id {
    return Ok(());
  }

  match check {
    ObjectCheck::AuthorOrAdmin if principal.is_admin => Ok(()),
    ObjectCheck::AuthorOrAdmin => Err(Error::forbidden(format!(
      "only the author or an administrator may change the tags of this {}",
      R::KIND
    ))),
    ObjectCheck::Author => Err(Error::forbidden(format!(
      "only the author may modify this {}",
      R::KIND
    ))),
  }
}
