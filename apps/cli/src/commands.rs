//! List management commands.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use glimmind_core::{
    import, Association, AssociationList, CycleEngine, FlipOrder, GameMode, Stage,
};

use crate::config::Config;
use crate::store::{ListStore, StoreError, StoreObserver};

/// Find a list by exact id, or by case-insensitive name prefix.
pub fn resolve<S: ListStore>(store: &S, owner_id: &str, query: &str) -> Result<AssociationList> {
    match store.load(query) {
        Ok(list) if list.owner_id == owner_id => return Ok(list),
        Ok(_) | Err(StoreError::NotFound(_)) | Err(StoreError::InvalidId(_)) => {}
        Err(e) => return Err(e).with_context(|| format!("failed to load list {query}")),
    }

    let needle = query.to_lowercase();
    let lists = store.list_all(owner_id)?;
    if let Some(exact) = lists.iter().find(|l| l.name.to_lowercase() == needle) {
        return Ok(exact.clone());
    }

    let mut matches: Vec<AssociationList> = lists
        .into_iter()
        .filter(|l| l.name.to_lowercase().starts_with(&needle))
        .collect();
    match matches.len() {
        0 => bail!("no list matches '{query}'"),
        1 => Ok(matches.remove(0)),
        n => {
            let names: Vec<&str> = matches.iter().map(|l| l.name.as_str()).collect();
            bail!("'{query}' matches {n} lists: {}", names.join(", "))
        }
    }
}

fn read_rows(path: &Path) -> Result<Vec<Association>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(import::into_associations(import::parse(&content)))
}

/// Create a list, optionally seeded from a bulk import file.
pub fn new_list<S: ListStore, W: Write>(
    store: &S,
    config: &Config,
    name: &str,
    concept: &str,
    import_file: Option<&Path>,
    out: &mut W,
) -> Result<AssociationList> {
    let name = name.trim();
    if name.is_empty() {
        bail!("list name cannot be empty");
    }

    let associations = match import_file {
        Some(path) => read_rows(path)?,
        None => Vec::new(),
    };

    let mut list = AssociationList::new(&config.owner_id, name, concept.trim(), associations);
    list.settings.threshold = config.default_threshold;
    store.save(&list)?;

    tracing::info!(list_id = %list.id, rows = list.associations.len(), "list created");
    writeln!(
        out,
        "Created '{}' ({}) with {} associations",
        list.name,
        list.id,
        list.associations.len()
    )?;
    Ok(list)
}

/// Append rows from a bulk import file to an existing list.
pub fn import_file<S: ListStore, W: Write>(
    store: &S,
    config: &Config,
    query: &str,
    path: &Path,
    out: &mut W,
) -> Result<usize> {
    let mut list = resolve(store, &config.owner_id, query)?;
    let associations = read_rows(path)?;
    let added = associations.len();

    list.append_associations(associations);
    list.touch();
    store.save(&list)?;

    tracing::info!(list_id = %list.id, added, "associations imported");
    writeln!(out, "Imported {added} associations into '{}'", list.name)?;
    Ok(added)
}

/// Print every list owned by the configured owner.
pub fn lists<S: ListStore, W: Write>(
    store: &S,
    config: &Config,
    search: Option<&str>,
    out: &mut W,
) -> Result<()> {
    let lists: Vec<AssociationList> = store
        .list_all(&config.owner_id)?
        .into_iter()
        .filter(|l| search.map_or(true, |q| l.matches_search(q)))
        .collect();

    if lists.is_empty() {
        writeln!(out, "No lists")?;
        return Ok(());
    }

    for list in &lists {
        let counts = list.stage_counts();
        writeln!(
            out,
            "{}  {}  [{}]  {}/{} mastered{}",
            list.id,
            list.name,
            list.concept,
            counts.mastered,
            counts.active(),
            if list.resume_state.is_some() { "  (in progress)" } else { "" }
        )?;
    }
    Ok(())
}

/// Print a list's settings, progress and rows.
pub fn show<S: ListStore, W: Write>(
    store: &S,
    config: &Config,
    query: &str,
    search: Option<&str>,
    out: &mut W,
) -> Result<()> {
    let list = resolve(store, &config.owner_id, query)?;
    let counts = list.stage_counts();
    let (term_label, definition_label) = list.face_labels();

    writeln!(out, "{} ({})", list.name, list.id)?;
    writeln!(out, "Concept: {}", list.concept)?;
    writeln!(
        out,
        "Mode: {}  Flip: {}  Threshold: {:.2}",
        list.settings.mode.as_str(),
        list.settings.flip_order.as_str(),
        list.settings.effective_threshold()
    )?;
    writeln!(
        out,
        "Unknown {}  Discovered {}  Recognized {}  Known {}  Mastered {}  Archived {}",
        counts.unknown,
        counts.discovered,
        counts.recognized,
        counts.known,
        counts.mastered,
        counts.archived
    )?;
    if let Some(resume) = &list.resume_state {
        writeln!(
            out,
            "In progress: stage {} ({}), item {} of {}",
            resume.cycle.to_value(),
            resume.cycle.name(),
            resume.index + 1,
            resume.queue.len()
        )?;
    }

    writeln!(out)?;
    writeln!(out, "{term_label} / {definition_label}")?;
    let rows = match search {
        Some(q) => list.search_associations(q),
        None => list.associations.iter().collect(),
    };
    for assoc in rows {
        let status = if assoc.archived { "archived" } else { assoc.status.as_str() };
        let position = list
            .associations
            .iter()
            .position(|a| a.id == assoc.id)
            .map_or(0, |p| p + 1);
        writeln!(
            out,
            "{:>4}  {:<10}  {}  /  {}",
            position, status, assoc.term, assoc.definition
        )?;
    }
    Ok(())
}

/// Find a row by its 1-based position as printed by `show`, or by id.
fn find_row(list: &AssociationList, row: &str) -> Result<String> {
    if let Ok(position) = row.parse::<usize>() {
        if let Some(assoc) = position.checked_sub(1).and_then(|i| list.associations.get(i)) {
            return Ok(assoc.id.clone());
        }
    }
    match list.find(row) {
        Some(assoc) => Ok(assoc.id.clone()),
        None => bail!("no row '{row}' in '{}'", list.name),
    }
}

/// Replace the term and definition of one row. Its status is kept.
pub fn edit_row<S: ListStore, W: Write>(
    store: &S,
    config: &Config,
    query: &str,
    row: &str,
    term: &str,
    definition: &str,
    out: &mut W,
) -> Result<()> {
    let (term, definition) = (term.trim(), definition.trim());
    if term.is_empty() && definition.is_empty() {
        bail!("a row needs a term or a definition");
    }

    let mut list = resolve(store, &config.owner_id, query)?;
    let id = find_row(&list, row)?;
    list.update_association(&id, term, definition);
    list.touch();
    store.save(&list)?;

    tracing::info!(list_id = %list.id, row_id = %id, "row edited");
    writeln!(out, "Updated row in '{}': {term} / {definition}", list.name)?;
    Ok(())
}

/// Delete one row from a list.
pub fn remove_row<S: ListStore, W: Write>(
    store: &S,
    config: &Config,
    query: &str,
    row: &str,
    out: &mut W,
) -> Result<()> {
    let mut list = resolve(store, &config.owner_id, query)?;
    let id = find_row(&list, row)?;
    let Some(removed) = list.remove_association(&id) else {
        bail!("no row '{row}' in '{}'", list.name);
    };
    list.touch();
    store.save(&list)?;

    tracing::info!(list_id = %list.id, row_id = %id, "row removed");
    writeln!(out, "Removed '{}' from '{}'", removed.term, list.name)?;
    Ok(())
}

/// Update list settings. Unset options keep their current value.
pub fn settings<S: ListStore, W: Write>(
    store: &S,
    config: &Config,
    query: &str,
    mode: Option<&str>,
    flip: Option<&str>,
    threshold: Option<f64>,
    out: &mut W,
) -> Result<()> {
    let mut list = resolve(store, &config.owner_id, query)?;

    if let Some(mode) = mode {
        list.settings.mode = match GameMode::parse(mode) {
            Some(mode) => mode,
            None => bail!("unknown mode '{mode}' (expected practice or written)"),
        };
    }
    if let Some(flip) = flip {
        list.settings.flip_order = match FlipOrder::parse(flip) {
            Some(flip) => flip,
            None => bail!("unknown flip order '{flip}' (expected normal or reversed)"),
        };
    }
    if let Some(threshold) = threshold {
        if !(0.0..=1.0).contains(&threshold) {
            bail!("threshold must be between 0 and 1, got {threshold}");
        }
        list.settings.threshold = threshold;
    }

    list.touch();
    store.save(&list)?;
    writeln!(
        out,
        "'{}': mode {}, flip {}, threshold {:.2}",
        list.name,
        list.settings.mode.as_str(),
        list.settings.flip_order.as_str(),
        list.settings.threshold
    )?;
    Ok(())
}

/// Put every active association back to unknown and drop progress.
pub fn reset<S, W>(store: &S, config: &Config, query: &str, out: &mut W) -> Result<()>
where
    S: ListStore + Clone + 'static,
    W: Write,
{
    let list = resolve(store, &config.owner_id, query)?;
    let mut engine = CycleEngine::new(list, StoreObserver::new(store.clone()));
    engine.reset();

    let list = engine.list();
    if engine.is_finished() {
        writeln!(out, "Reset '{}' (nothing to learn)", list.name)?;
    } else {
        writeln!(
            out,
            "Reset '{}': {} associations back to {}",
            list.name,
            list.stage_counts().unknown,
            Stage::Introduction.name()
        )?;
    }
    Ok(())
}

pub fn delete<S: ListStore, W: Write>(
    store: &S,
    config: &Config,
    query: &str,
    out: &mut W,
) -> Result<()> {
    let list = resolve(store, &config.owner_id, query)?;
    store.delete(&list.id)?;
    tracing::info!(list_id = %list.id, "list deleted");
    writeln!(out, "Deleted '{}'", list.name)?;
    Ok(())
}
