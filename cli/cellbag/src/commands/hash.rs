//! `cellbag hash`: one hex hash per root.

use anyhow::Result;

pub fn run(input: &str) -> Result<()> {
    let (_, bag) = super::load(input)?;
    for root in &bag.roots {
        println!("{}", root.hash_hex());
    }
    Ok(())
}
