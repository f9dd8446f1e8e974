//! Loading blueprint folders into a [`Config`].

use kdl::KdlDocument;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use yard_core::{Config, DependencyGraph, Resolver};

use crate::decode::{decode_blueprint, decode_document};
use crate::{ConfigError, ConfigResult, EvalContext};

/// Extension of resource files.
pub const RESOURCE_EXTENSION: &str = "kdl";
/// Extension of blueprint metadata files.
pub const BLUEPRINT_EXTENSION: &str = "yard";

/// Load, resolve and validate a blueprint folder.
///
/// The returned config holds the reserved `network.wan`, every declared
/// resource, and is known to have resolvable references and an acyclic
/// dependency graph.
pub fn load(folder: impl AsRef<Path>, ctx: &EvalContext) -> ConfigResult<Config> {
    let mut config = Config::with_wan();
    parse_folder(folder, &mut config, ctx)?;

    Resolver::new(&config).validate_references()?;
    let graph = DependencyGraph::build(&config)?;
    info!(
        resources = graph.node_count(),
        edges = graph.edge_count(),
        "loaded blueprint"
    );

    Ok(config)
}

/// Parse every configuration file of a folder into `config`.
///
/// The first `*.yard` file becomes the blueprint. Resource files are read
/// from the folder itself, then from its immediate subdirectories.
pub fn parse_folder(
    folder: impl AsRef<Path>,
    config: &mut Config,
    ctx: &EvalContext,
) -> ConfigResult<()> {
    let folder = absolute(folder.as_ref())?;
    let entries = list_dir(&folder)?;

    if let Some(blueprint) = entries
        .iter()
        .find(|p| p.is_file() && has_extension(p, BLUEPRINT_EXTENSION))
    {
        parse_blueprint_file(blueprint, config, ctx)?;
    }

    for file in entries
        .iter()
        .filter(|p| p.is_file() && has_extension(p, RESOURCE_EXTENSION))
    {
        parse_file(file, config, ctx)?;
    }

    for dir in entries.iter().filter(|p| p.is_dir()) {
        for file in list_dir(dir)?
            .iter()
            .filter(|p| p.is_file() && has_extension(p, RESOURCE_EXTENSION))
        {
            parse_file(file, config, ctx)?;
        }
    }

    Ok(())
}

/// Parse one resource file into `config`.
pub fn parse_file(path: impl AsRef<Path>, config: &mut Config, ctx: &EvalContext) -> ConfigResult<()> {
    let path = absolute(path.as_ref())?;
    let source = read(&path)?;
    parse_str(&source, &path, config, ctx)
}

/// Parse resource blocks declared in `path` into `config`.
///
/// Either every block of the source is registered or none is.
pub fn parse_str(
    source: &str,
    path: impl AsRef<Path>,
    config: &mut Config,
    ctx: &EvalContext,
) -> ConfigResult<()> {
    let path = path.as_ref();
    let doc = parse_document(source, path)?;
    let resources = decode_document(&doc, path, ctx)?;

    let mut seen = HashSet::new();
    for resource in &resources {
        let address = resource.address();
        if config.position(&address).is_some() || !seen.insert(address.clone()) {
            return Err(yard_core::Error::ResourceExists { address }.into());
        }
    }

    debug!(file = %path.display(), blocks = resources.len(), "parsed file");
    for resource in resources {
        config.add_resource(resource)?;
    }

    Ok(())
}

/// Parse a blueprint metadata file and attach it to `config`.
pub fn parse_blueprint_file(
    path: impl AsRef<Path>,
    config: &mut Config,
    ctx: &EvalContext,
) -> ConfigResult<()> {
    let path = path.as_ref();
    let source = read(path)?;
    parse_blueprint_str(&source, path, config, ctx)
}

pub fn parse_blueprint_str(
    source: &str,
    path: impl AsRef<Path>,
    config: &mut Config,
    ctx: &EvalContext,
) -> ConfigResult<()> {
    let path = path.as_ref();
    let doc = parse_document(source, path)?;
    let blueprint = decode_blueprint(&doc, ctx)?;
    debug!(file = %path.display(), title = %blueprint.title, "parsed blueprint");
    config.set_blueprint(blueprint);
    Ok(())
}

fn parse_document(source: &str, path: &Path) -> ConfigResult<KdlDocument> {
    source.parse().map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn read(path: &Path) -> ConfigResult<String> {
    fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn absolute(path: &Path) -> ConfigResult<PathBuf> {
    std::path::absolute(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Entries of a directory, sorted by path.
fn list_dir(dir: &Path) -> ConfigResult<Vec<PathBuf>> {
    let read_err = |source| ConfigError::Read {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        entries.push(entry.map_err(read_err)?.path());
    }
    entries.sort();
    Ok(entries)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().is_some_and(|e| e == extension)
}
