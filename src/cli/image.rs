use anyhow::{Context, Result};
use bumpversion::Dockerfile;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Attribute, Cell, Table};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;
use tracing::{debug, info};

/// Path that stands for standard input
pub const STDIO: &str = "-";

/// Where a rewritten Dockerfile goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    /// Replace the Dockerfile that was read
    InPlace,
    File(String),
}

/// Read and index a Dockerfile, or standard input for `-`
pub fn open_dockerfile(path: &str) -> Result<Dockerfile> {
    if path == STDIO {
        debug!("Reading Dockerfile from stdin");
        let stdin = std::io::stdin();
        return Dockerfile::new("<stdin>", stdin.lock())
            .context("Failed to read Dockerfile from stdin");
    }

    let file = File::open(path).with_context(|| format!("Failed to open Dockerfile: {}", path))?;
    Dockerfile::new(path, BufReader::new(file))
        .with_context(|| format!("Failed to read Dockerfile: {}", path))
}

/// Build the NAME / TAG / DIGEST table for every image, sorted by name
pub fn images_table(dockerfile: &Dockerfile) -> Table {
    let mut images: Vec<_> = dockerfile.artifacts().values().collect();
    images.sort_by(|a, b| a.name().cmp(b.name()));

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("NAME").add_attribute(Attribute::Bold),
            Cell::new("TAG").add_attribute(Attribute::Bold),
            Cell::new("DIGEST").add_attribute(Attribute::Bold),
        ]);

    for image in images {
        table.add_row(vec![
            Cell::new(image.name()),
            Cell::new(image.tag().unwrap_or("-")),
            Cell::new(image.digest().unwrap_or("-")),
        ]);
    }

    table
}

/// List the images a Dockerfile is built from
pub fn list_images(path: &str) -> Result<()> {
    let dockerfile = open_dockerfile(path)?;

    if dockerfile.artifacts().is_empty() {
        println!("No images found in '{}'", dockerfile.source());
        return Ok(());
    }

    println!("{}", images_table(&dockerfile));
    Ok(())
}

/// Print the full reference of one image
pub fn get_image(path: &str, name: &str) -> Result<()> {
    let dockerfile = open_dockerfile(path)?;
    let image = dockerfile
        .artifact(name)
        .ok_or_else(|| bumpversion::Error::NotFound {
            name: name.to_string(),
        })
        .with_context(|| format!("Image not present in {}", dockerfile.source()))?;

    println!("{}", image);
    Ok(())
}

/// Change the version of one image and emit the result
pub fn set_image_version(path: &str, name: &str, version: &str, target: &OutputTarget) -> Result<()> {
    let mut dockerfile = open_dockerfile(path)?;
    dockerfile
        .set_version(name, version)
        .with_context(|| format!("Failed to update {}", dockerfile.source()))?;

    match target {
        OutputTarget::Stdout => {
            let stdout = std::io::stdout();
            dockerfile
                .write(stdout.lock())
                .context("Failed to write Dockerfile to stdout")?;
        }
        OutputTarget::InPlace => {
            if path == STDIO {
                anyhow::bail!("Cannot write in place when reading from stdin");
            }
            replace_file(Path::new(path), &dockerfile)?;
            info!("Wrote {}", path);
        }
        OutputTarget::File(output) => {
            let file = File::create(output)
                .with_context(|| format!("Failed to create output file: {}", output))?;
            dockerfile
                .write(file)
                .with_context(|| format!("Failed to write output file: {}", output))?;
            info!("Wrote {}", output);
        }
    }

    Ok(())
}

/// Atomically replace `path` with the content of `dockerfile`
fn replace_file(path: &Path, dockerfile: &Dockerfile) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    dockerfile
        .write(temp.as_file_mut())
        .context("Failed to write temp file")?;
    temp.as_file_mut().flush()?;
    temp.persist(path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;

    Ok(())
}
