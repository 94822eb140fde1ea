use crate::error::ResolveError;
use crate::form::{BaseForm, FormType, SymbolicId};
use crate::host::FormLookup;

/// Resolve a symbolic identifier and check its category.
///
/// An empty `expected` accepts any category.
pub fn resolve<L: FormLookup + ?Sized>(
    lookup: &L,
    raw: &str,
    expected: &[FormType],
) -> Result<BaseForm, ResolveError> {
    let id = SymbolicId::parse(raw)?;
    let Some(form) = lookup.lookup_form(&id.document, id.local_id) else {
        return Err(ResolveError::UnknownForm(id));
    };
    if !expected.is_empty() && !expected.contains(&form.form_type) {
        return Err(ResolveError::WrongCategory {
            id,
            actual: form.form_type,
            expected: expected.to_vec(),
        });
    }
    Ok(form)
}
