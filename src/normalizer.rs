use crate::catalog::ItemCatalog;
use crate::model::CatalogEntry;

/// Maps free-form user input to a canonical catalog id.
///
/// Priority: exact id, exact name, then partial name, each against the
/// lowercased label as stored. Only when nothing matches are the same two
/// name passes repeated on labels with `§x` codes removed. Ties go to the
/// entry that comes first in the catalog, so two items sharing a name always
/// resolve to the earlier one.
pub fn resolve<'a>(catalog: &'a ItemCatalog, input: &str) -> Option<&'a str> {
    let query = input.trim().to_lowercase();
    if query.is_empty() {
        return None;
    }

    if let Some(entry) = catalog.get(&query.to_uppercase()) {
        return Some(entry.id.as_str());
    }

    let find = |name: fn(&CatalogEntry) -> &str, exact: bool| {
        catalog
            .iter()
            .find(|e| {
                let name = name(e);
                if exact { name == query } else { !name.is_empty() && name.contains(&query) }
            })
            .map(|e| e.id.as_str())
    };

    find(stored_name, true)
        .or_else(|| find(stored_name, false))
        .or_else(|| find(plain_name, true))
        .or_else(|| find(plain_name, false))
}

fn stored_name(entry: &CatalogEntry) -> &str {
    &entry.search_name
}

fn plain_name(entry: &CatalogEntry) -> &str {
    &entry.plain_name
}
