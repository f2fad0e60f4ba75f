/*! Integration tests for cfgdoc.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - document: Tests for the declaration/content dual tree, loading and the bijection property
 * - section: Tests for property sets, text sections and native trees
 * - comment: Tests for comment slots on groups, sections and entries
 * - protection: Tests for encrypting and decrypting sections and native dictionaries
 * - persistence: Tests for sinks, auto-save and the file store
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("cfgdoc=info".parse().unwrap()))
        .with_test_writer()
        .try_init();
}

mod comment;
mod helpers;
mod persistence;
mod protection;
mod section;
