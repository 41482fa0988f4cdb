// Key names the surrounding stash layers reserve on plain data objects.
// A user object owning one of these exact names would be misread as a
// structural node by the reference and type-tag resolvers.
pub(crate) const KEY_STASH_REF: &str = "_stashRef";
pub(crate) const KEY_STASH_TYPE: &str = "_stashType";
pub(crate) const KEY_STASH_ESCAPE: &str = "_stashEscape";

/// Whether the key name carries structural meaning. Exact match only;
/// underscore-extended variants of the marker key are not reserved.
pub(crate) fn is_reserved(key: &str) -> bool {
    key == KEY_STASH_REF || key == KEY_STASH_TYPE || key == KEY_STASH_ESCAPE
}
