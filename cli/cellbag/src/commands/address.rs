//! `cellbag parse-address`: show every textual form of an address.

use anyhow::{Context, Result};
use cellbag_core::{Address, FriendlyFormat};

pub fn run(input: &str) -> Result<()> {
    let address = Address::parse(input).with_context(|| format!("parsing address {input}"))?;
    for (label, form) in forms(&address) {
        println!("{label:<24}{form}");
    }
    Ok(())
}

fn forms(address: &Address) -> Vec<(&'static str, String)> {
    let friendly = |bounceable, test_only| {
        address.to_friendly_string(FriendlyFormat {
            url_safe: true,
            bounceable,
            test_only,
        })
    };
    vec![
        ("raw", address.to_raw_string()),
        ("bounceable", friendly(true, false)),
        ("non-bounceable", friendly(false, false)),
        ("bounceable (testnet)", friendly(true, true)),
        ("non-bounceable (testnet)", friendly(false, true)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn friendly_forms_round_trip() {
        let address = Address::parse("EQDxxpeLM0R2HH3nmtDoQsRL959eYb4pRW1tNL257U30KBOX").unwrap();
        let forms = forms(&address);
        assert_eq!(
            forms[0].1,
            "0:f1c6978b3344761c7de79ad0e842c44bf79f5e61be29456d6d34bdb9ed4df428"
        );
        for (_, form) in &forms {
            assert_eq!(Address::parse(form).unwrap(), address);
        }
    }
}
