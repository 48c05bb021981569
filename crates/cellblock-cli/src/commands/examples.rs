//! Built-in example programs

use anyhow::Result;
use cellblock_core::service::code_examples;

use super::print_json;

pub fn show() -> Result<()> {
    print_json(&code_examples(), true)
}
