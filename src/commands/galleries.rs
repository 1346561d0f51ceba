// Photo galleries: listing, download, likes and comments.

use std::fs;
use std::path::PathBuf;

use serde_json::{json, Value};

use super::{hint_next_page, nodes, opt_str, print_json, variables, App};
use crate::cli::GalleryArgs;
use crate::download::{galleries_from, Downloader, Gallery};
use crate::error::{Error, Result};
use crate::queries;
use crate::table::{cell, Table};
use crate::ui;

/// Galleries considered by `gallery-download`.
const DOWNLOAD_GALLERY_LIMIT: u32 = 100;
/// Images requested per gallery when downloading.
const DOWNLOAD_IMAGE_LIMIT: u32 = 1000;

pub fn list(app: &App, args: &GalleryArgs) -> Result<()> {
    let client = app.connect()?;
    let response = app.fetch(
        &client,
        queries::GALLERIES,
        variables([
            ("groupId", opt_str(args.group_id.as_deref())),
            ("first", json!(args.first)),
            ("after", opt_str(args.after.as_deref())),
            ("search", json!(args.search)),
            ("order", opt_str(args.order.as_deref())),
        ]),
    )?;
    let connection = response.field("galleries");
    app.emit(&response, |_| {
        let mut table = Table::new("Galleries", &["ID", "Name", "Created", "Images"]);
        for node in nodes(connection) {
            table.push(vec![
                cell(&node["id"]),
                cell(&node["name"]),
                cell(&node["created"]),
                cell(&node["imagesCount"]),
            ]);
        }
        table
    })?;
    hint_next_page(app, connection);
    Ok(())
}

pub fn download(
    app: &App,
    ids: Vec<String>,
    all: bool,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let base = output_dir.unwrap_or_else(|| app.settings().download_dir.clone());
    fs::create_dir_all(&base)?;

    let client = app.connect()?;
    let response = app.fetch(
        &client,
        queries::GALLERIES,
        json!({ "first": DOWNLOAD_GALLERY_LIMIT, "imagesFirst": DOWNLOAD_IMAGE_LIMIT }),
    )?;
    let galleries = galleries_from(response.data());

    let ids = if ids.is_empty() && !all {
        pick_galleries(app, &galleries)?
    } else {
        ids
    };
    let selected = select(galleries, &ids);

    let downloader = Downloader::new(app.settings().timeout)?;
    let written = downloader.download_all(&selected, &base, all)?;

    if app.json() {
        let dirs: Vec<String> = written.iter().map(|d| d.display().to_string()).collect();
        return print_json(&json!({ "downloaded": dirs }));
    }
    if written.is_empty() {
        ui::warn("No galleries downloaded (all already present?).");
        return Ok(());
    }
    println!("Downloaded galleries:");
    for dir in &written {
        println!("- {}", dir.display());
    }
    Ok(())
}

fn pick_galleries(app: &App, galleries: &[Gallery]) -> Result<Vec<String>> {
    if galleries.is_empty() {
        return Err(Error::InvalidInput("no galleries available to choose from".into()));
    }
    let labels: Vec<String> = galleries
        .iter()
        .map(|g| format!("{} ({} images)", g.name, g.image_urls.len()))
        .collect();
    let picked = app.picker().pick_many("Select galleries", &labels)?;
    if picked.is_empty() {
        return Err(Error::InvalidInput("no galleries selected".into()));
    }
    Ok(picked
        .into_iter()
        .filter_map(|i| galleries.get(i))
        .map(|g| g.id.clone())
        .collect())
}

/// Galleries with the given ids, in listing order. No ids selects all.
fn select(galleries: Vec<Gallery>, ids: &[String]) -> Vec<Gallery> {
    if ids.is_empty() {
        return galleries;
    }
    for id in ids {
        if !galleries.iter().any(|g| &g.id == id) {
            ui::warn(&format!("Gallery {id} not found among the latest galleries."));
        }
    }
    galleries
        .into_iter()
        .filter(|g| ids.contains(&g.id))
        .collect()
}

pub fn like(app: &App, id: &str) -> Result<()> {
    let client = app.connect()?;
    let response = app.fetch(&client, queries::SET_GALLERY_LIKE, json!({ "galleryId": id }))?;
    if app.json() {
        return print_json(response.envelope());
    }
    let result = response.field("setGalleryLike");
    if result["isLiked"] == Value::Bool(true) {
        ui::success(&format!("Gallery {id} liked."));
    } else {
        ui::success(&format!("Gallery {id} unliked."));
    }
    Ok(())
}

pub fn comment(app: &App, id: &str, content: &str) -> Result<()> {
    let client = app.connect()?;
    let response = app.fetch(
        &client,
        queries::CREATE_GALLERY_COMMENT,
        json!({ "galleryId": id, "content": content }),
    )?;
    if app.json() {
        return print_json(response.envelope());
    }
    let errors = &response.field("createGalleryComment")["errors"];
    match errors {
        Value::Null => {}
        Value::Array(list) if list.is_empty() => {}
        other => return Err(Error::InvalidInput(format!("comment rejected: {other}"))),
    }
    ui::success("Comment added.");
    Ok(())
}
