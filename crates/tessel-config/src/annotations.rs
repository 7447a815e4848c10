use std::any::type_name;

use documented::{Documented, DocumentedFields};
use toml_edit::{Decor, Item, RawString, Table};
use tracing::warn;

use crate::error::{ConfigError, Result};

/// Turns every line of `docs` into a `#` comment placed in front of the item
/// owning `decor`. Comments already present are kept, separated by an empty
/// comment line.
pub fn prepend_doc_comments(decor: &mut Decor, docs: &str) {
    let comments: String = docs
        .lines()
        .map(|line| {
            if line.is_empty() {
                "#\n".to_string()
            } else {
                format!("# {line}\n")
            }
        })
        .collect();

    let new_prefix = match decor.prefix().and_then(RawString::as_str) {
        None | Some("") => comments,
        Some(prefix) if prefix.ends_with('\n') => format!("{prefix}#\n{comments}"),
        Some(prefix) => format!("{prefix}\n{comments}"),
    };
    decor.set_prefix(new_prefix);
}

/// Annotates every key of `table` with the field docs of `T`.
///
/// Sub-tables get the docs of the field they are stored under; nested
/// settings structs annotate their own keys through a second call. When
/// `is_root` is false the container docs of `T` are placed above the table
/// header as well.
pub fn annotate_toml_table<T>(table: &mut Table, is_root: bool) -> Result<()>
where
    T: Documented + DocumentedFields,
{
    if !is_root {
        prepend_doc_comments(table.decor_mut(), T::DOCS);
    }

    for (mut key, item) in table.iter_mut() {
        let name = key.get().to_string();
        let Ok(docs) = T::get_field_docs(&name) else {
            warn!(
                field = %name,
                container = type_name::<T>(),
                "no documentation found for TOML key"
            );
            continue;
        };

        match item {
            Item::None => return Err(ConfigError::UnexpectedTomlItem(name)),
            Item::Value(_) => prepend_doc_comments(key.leaf_decor_mut(), docs),
            Item::Table(sub_table) => prepend_doc_comments(sub_table.decor_mut(), docs),
            Item::ArrayOfTables(_) => return Err(ConfigError::UnexpectedTomlItem(name)),
        }
    }

    Ok(())
}
