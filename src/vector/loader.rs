/*
 * Copyright (c) 2024 The NAMIB Project Developers.
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! Loading of test vectors from fixture directories.
//!
//! Fixtures are grouped into [`FixtureSuite`]s, each of which lists the directories (relative to
//! the fixture root of a [`LoaderConfig`]) and the [`Construction`] it is tested with.
//! [`load_vectors`] can also be used with an explicit list of directories.
//!
//! Vectors that lack required fields or contain invalid values are not treated as errors, but
//! are reported as [`SkippedVector`]s. Unreadable directories or files and invalid JSON are
//! errors.

use std::path::{Path, PathBuf};

use strum_macros::{Display, EnumIter, EnumString};

use crate::error::VectorError;
use crate::vector::TestVector;

/// Fixture root used if none is configured.
pub const DEFAULT_FIXTURE_ROOT: &str = "tests/cose_examples";

/// Environment variable that overrides the fixture root in [`LoaderConfig::from_env`].
pub const FIXTURE_DIR_ENV: &str = "COSE_FIXTURE_DIR";

/// A COSE construction, named as in the `input` object of a test vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Construction {
    /// `COSE_Mac0`
    Mac0,
    /// `COSE_Mac`
    Mac,
    /// `COSE_Encrypt0`
    Encrypted,
    /// `COSE_Encrypt`
    Enveloped,
    /// `COSE_Sign1`
    Sign0,
    /// `COSE_Sign`
    Sign,
}

/// A family of test vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum FixtureSuite {
    /// `COSE_Mac0` vectors.
    Mac0,
    /// `COSE_Mac` vectors using HMAC and AES-CBC-MAC.
    Mac,
    /// `COSE_Encrypt0` vectors using AES-CCM and AES-GCM.
    Encrypt0,
    /// `COSE_Encrypt` vectors using AES-CCM and AES-GCM.
    Encrypt,
    /// `COSE_Encrypt` vectors using direct ECDH key agreement.
    EcdhDirect,
    /// `COSE_Encrypt` vectors using ECDH key agreement with key wrap.
    EcdhWrap,
    /// `COSE_Encrypt` vectors using direct ECDH key agreement on X25519.
    X25519Direct,
    /// `COSE_Encrypt` vectors from RFC 8152, including multi-layer ones.
    TripleLayer,
    /// `COSE_Encrypt` vectors using direct HKDF key derivation.
    HkdfHmacDirect,
    /// `COSE_Sign1` vectors.
    Sign1,
    /// `COSE_Sign` vectors.
    Sign,
    /// Vectors with counter signatures.
    Countersign,
}

impl FixtureSuite {
    /// Directories of this suite, relative to the fixture root.
    #[must_use]
    pub fn directories(self) -> &'static [&'static str] {
        match self {
            FixtureSuite::Mac0 => &["mac0-tests"],
            FixtureSuite::Mac => &["mac-tests", "hmac-examples", "cbc-mac-examples"],
            FixtureSuite::Encrypt0 => &["aes-ccm-examples", "aes-gcm-examples", "encrypted-tests"],
            FixtureSuite::Encrypt => &["aes-ccm-examples", "aes-gcm-examples", "enveloped-tests"],
            FixtureSuite::EcdhDirect => &["ecdh-direct-examples"],
            FixtureSuite::EcdhWrap => &["ecdh-wrap-examples"],
            FixtureSuite::X25519Direct => &["X25519-tests"],
            FixtureSuite::TripleLayer => &["RFC8152"],
            FixtureSuite::HkdfHmacDirect => &["hkdf-hmac-sha-examples"],
            FixtureSuite::Sign1 => &["sign1-tests"],
            FixtureSuite::Sign => &["sign-tests"],
            FixtureSuite::Countersign => &["countersign"],
        }
    }

    /// Construction the vectors of this suite are loaded for.
    #[must_use]
    pub fn construction(self) -> Construction {
        match self {
            FixtureSuite::Mac0 => Construction::Mac0,
            FixtureSuite::Mac => Construction::Mac,
            FixtureSuite::Encrypt0 => Construction::Encrypted,
            FixtureSuite::Encrypt
            | FixtureSuite::EcdhDirect
            | FixtureSuite::EcdhWrap
            | FixtureSuite::X25519Direct
            | FixtureSuite::TripleLayer
            | FixtureSuite::HkdfHmacDirect => Construction::Enveloped,
            FixtureSuite::Sign1 => Construction::Sign0,
            FixtureSuite::Sign | FixtureSuite::Countersign => Construction::Sign,
        }
    }
}

/// Configuration of the fixture loader.
#[derive(Debug, PartialEq, Eq, Clone, Builder)]
#[builder(setter(into), derive(Debug, PartialEq))]
pub struct LoaderConfig {
    /// Directory containing the fixture directories of all suites.
    #[builder(default = "PathBuf::from(DEFAULT_FIXTURE_ROOT)")]
    pub fixture_root: PathBuf,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            fixture_root: PathBuf::from(DEFAULT_FIXTURE_ROOT),
        }
    }
}

impl LoaderConfig {
    /// Returns a new builder for this struct.
    #[must_use]
    pub fn builder() -> LoaderConfigBuilder {
        LoaderConfigBuilder::default()
    }

    /// Creates a configuration whose fixture root is taken from the `COSE_FIXTURE_DIR`
    /// environment variable, falling back to [`DEFAULT_FIXTURE_ROOT`].
    #[must_use]
    pub fn from_env() -> LoaderConfig {
        std::env::var_os(FIXTURE_DIR_ENV).map_or_else(LoaderConfig::default, |root| {
            LoaderConfig {
                fixture_root: PathBuf::from(root),
            }
        })
    }

    /// Absolute (or root relative) directories of `suite`.
    #[must_use]
    pub fn directories(&self, suite: FixtureSuite) -> Vec<PathBuf> {
        suite
            .directories()
            .iter()
            .map(|dir| self.fixture_root.join(dir))
            .collect()
    }

    /// Loads all vectors of `suite`.
    ///
    /// # Errors
    ///
    /// See [`load_vectors`].
    pub fn load(&self, suite: FixtureSuite) -> Result<LoadedSuite, VectorError> {
        let loaded = load_vectors(suite.construction(), &self.directories(suite))?;
        log::info!(
            "loaded {} vectors of suite {suite} ({} skipped)",
            loaded.vectors.len(),
            loaded.skipped.len()
        );
        Ok(loaded)
    }

    /// Loads the vectors for `construction` from the given directories below the fixture root.
    ///
    /// # Errors
    ///
    /// See [`load_vectors`].
    pub fn load_construction(
        &self,
        construction: Construction,
        directories: &[&str],
    ) -> Result<LoadedSuite, VectorError> {
        let directories: Vec<PathBuf> = directories
            .iter()
            .map(|dir| self.fixture_root.join(dir))
            .collect();
        load_vectors(construction, &directories)
    }
}

/// A vector file that was not loaded.
#[derive(Debug)]
pub struct SkippedVector {
    /// File of the vector.
    pub path: PathBuf,
    /// Why the vector was skipped.
    pub reason: VectorError,
}

/// Result of loading a set of fixture directories.
#[derive(Debug, Default)]
pub struct LoadedSuite {
    /// Vectors containing the requested construction, in directory order and, within a
    /// directory, in file name order.
    pub vectors: Vec<TestVector>,
    /// Vectors that contain the requested construction (or whose construction can't be
    /// determined) but couldn't be loaded.
    pub skipped: Vec<SkippedVector>,
}

/// Loads the vectors for `construction` from all `.json` files in `directories`.
///
/// Files whose `input` has no object for `construction` are silently left out. Files that
/// can't be turned into a [`TestVector`] are skipped.
///
/// # Errors
///
/// - [`VectorError::Io`] if a directory or file can't be read.
/// - [`VectorError::Json`] if a file doesn't contain valid JSON.
pub fn load_vectors<P: AsRef<Path>>(
    construction: Construction,
    directories: &[P],
) -> Result<LoadedSuite, VectorError> {
    let mut loaded = LoadedSuite::default();
    for dir in directories {
        for path in json_files(dir.as_ref())? {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| VectorError::Io(path.clone(), e))?;
            let json = serde_json::from_str(&content)
                .map_err(|e| VectorError::Json(path.clone(), e))?;
            match TestVector::from_json(path.clone(), construction, json) {
                Ok(Some(vector)) => {
                    log::debug!("loaded vector \"{}\" from {}", vector.title, path.display());
                    loaded.vectors.push(vector);
                }
                Ok(None) => {
                    log::debug!("{} has no {construction} construction", path.display());
                }
                Err(reason) => {
                    log::warn!("skipping {}: {reason}", path.display());
                    loaded.skipped.push(SkippedVector { path, reason });
                }
            }
        }
    }
    Ok(loaded)
}

/// Lists the `.json` files in `dir`, sorted by name.
fn json_files(dir: &Path) -> Result<Vec<PathBuf>, VectorError> {
    let io_error = |e| VectorError::Io(dir.to_path_buf(), e);
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
