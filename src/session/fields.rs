//! List-valued fields of the built-in document kinds, each wired to its dialog.

use serde_json::Value;

use crate::{
    domain::{AppConfig, CollectionEntry, EntryKind, EntryList, ImageProfiles, Layout},
    modal::DialogKind,
};

use super::collection::CollectionMutator;

/// Custom fields of a layout. The dialog may only offer [`EntryKind::ALL`].
pub fn layout_fields() -> CollectionMutator<Layout> {
    CollectionMutator::new(
        "custFields",
        DialogKind::LayoutField,
        cust_fields,
        cust_fields_mut,
    )
    .accepting(&EntryKind::ALL)
    .with_remove_prompt(field_remove_prompt)
}

pub fn buckets() -> CollectionMutator<AppConfig> {
    CollectionMutator::new("buckets", DialogKind::Bucket, buckets_of, buckets_mut)
        .restart_on_open()
        .restart_on_remove()
}

pub fn cfdists() -> CollectionMutator<AppConfig> {
    CollectionMutator::new("cfdists", DialogKind::CfDist, cfdists_of, cfdists_mut)
        .restart_on_open()
        .restart_on_remove()
}

pub fn global_functions() -> CollectionMutator<AppConfig> {
    CollectionMutator::new(
        "pugGlobalScripts",
        DialogKind::GlobalFunction,
        scripts_of,
        scripts_mut,
    )
}

pub fn bookmarks() -> CollectionMutator<AppConfig> {
    CollectionMutator::new("bookmarks", DialogKind::Bookmark, bookmarks_of, bookmarks_mut)
        .restart_on_open()
        .restart_on_remove()
}

/// Feeds reference categories, so their dialog receives the current category list.
pub fn feeds() -> CollectionMutator<AppConfig> {
    CollectionMutator::new("feeds", DialogKind::Feed, feeds_of, feeds_mut)
        .with_context(category_context)
        .restart_on_remove()
}

pub fn variables() -> CollectionMutator<AppConfig> {
    CollectionMutator::new("variables", DialogKind::Variable, variables_of, variables_mut)
}

/// Categories are plain strings pushed without a dialog.
pub fn categories() -> CollectionMutator<AppConfig> {
    CollectionMutator::new(
        "categories",
        DialogKind::Category,
        categories_of,
        categories_mut,
    )
}

/// Image profiles are replaced by their `id` on update.
pub fn image_profiles() -> CollectionMutator<ImageProfiles> {
    CollectionMutator::new(
        "lstProfiles",
        DialogKind::ImageProfile,
        profiles_of,
        profiles_mut,
    )
    .update_by_field("id")
}

/// Every config list field by its wire name.
pub fn config_field(name: &str) -> Option<CollectionMutator<AppConfig>> {
    let mutator = match name {
        "buckets" => buckets(),
        "cfdists" => cfdists(),
        "pugGlobalScripts" => global_functions(),
        "bookmarks" => bookmarks(),
        "feeds" => feeds(),
        "variables" => variables(),
        "categories" => categories(),
        _ => return None,
    };
    Some(mutator)
}

pub const CONFIG_FIELDS: [&str; 7] = [
    "buckets",
    "cfdists",
    "pugGlobalScripts",
    "bookmarks",
    "feeds",
    "variables",
    "categories",
];

fn field_remove_prompt(entry: &CollectionEntry) -> String {
    format!(
        "Do you really want to delete the field '{}'?",
        entry.text("fldName").unwrap_or_default()
    )
}

fn category_context(config: &AppConfig) -> Value {
    Value::Array(config.category_names())
}

fn cust_fields(layout: &Layout) -> &EntryList {
    &layout.cust_fields
}

fn cust_fields_mut(layout: &mut Layout) -> &mut EntryList {
    &mut layout.cust_fields
}

fn buckets_of(config: &AppConfig) -> &EntryList {
    &config.buckets
}

fn buckets_mut(config: &mut AppConfig) -> &mut EntryList {
    &mut config.buckets
}

fn cfdists_of(config: &AppConfig) -> &EntryList {
    &config.cfdists
}

fn cfdists_mut(config: &mut AppConfig) -> &mut EntryList {
    &mut config.cfdists
}

fn scripts_of(config: &AppConfig) -> &EntryList {
    &config.pug_global_scripts
}

fn scripts_mut(config: &mut AppConfig) -> &mut EntryList {
    &mut config.pug_global_scripts
}

fn bookmarks_of(config: &AppConfig) -> &EntryList {
    &config.bookmarks
}

fn bookmarks_mut(config: &mut AppConfig) -> &mut EntryList {
    &mut config.bookmarks
}

fn feeds_of(config: &AppConfig) -> &EntryList {
    &config.feeds
}

fn feeds_mut(config: &mut AppConfig) -> &mut EntryList {
    &mut config.feeds
}

fn variables_of(config: &AppConfig) -> &EntryList {
    &config.variables
}

fn variables_mut(config: &mut AppConfig) -> &mut EntryList {
    &mut config.variables
}

fn categories_of(config: &AppConfig) -> &EntryList {
    &config.categories
}

fn categories_mut(config: &mut AppConfig) -> &mut EntryList {
    &mut config.categories
}

fn profiles_of(profiles: &ImageProfiles) -> &EntryList {
    &profiles.profiles
}

fn profiles_mut(profiles: &mut ImageProfiles) -> &mut EntryList {
    &mut profiles.profiles
}
