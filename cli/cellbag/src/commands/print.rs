//! `cellbag print`: recursive `x{HEX}` dump of every root.

use anyhow::Result;

pub fn run(input: &str) -> Result<()> {
    let (_, bag) = super::load(input)?;
    for root in &bag.roots {
        print!("{}", root.print());
    }
    Ok(())
}
