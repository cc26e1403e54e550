pub mod env_sh;
pub mod run_cmd_sh;
pub mod run_we_sh;
pub mod runseg_sh;
pub mod west_cfg;
pub mod zip;

use crate::core::error::Result;
use crate::core::params::{ACCOUNT, EMAIL, PROTEIN_NAME, ParamInfo, ParameterSet};
use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};

/// Builds the placeholder matcher for one template.
pub(crate) fn placeholder_matcher(placeholders: &[&str]) -> AhoCorasick {
    AhoCorasickBuilder::new()
        .match_kind(MatchKind::LeftmostFirst)
        .build(placeholders)
        .expect("placeholder automaton")
}

/// Single pass over `template`; replacement text is never rescanned, so a
/// value that itself looks like a placeholder is emitted verbatim.
pub(crate) fn substitute<const N: usize>(
    matcher: &AhoCorasick,
    template: &str,
    values: [&str; N],
) -> String {
    debug_assert_eq!(matcher.patterns_len(), N);
    let mut out = String::with_capacity(template.len() + 256);
    matcher.replace_all_with(template, &mut out, |mat, _, dst| {
        dst.push_str(values[mat.pattern().as_usize()]);
        true
    });
    out
}

/// Identification fields shared by the two SLURM batch scripts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchInputs {
    pub protein_name: String,
    pub account: String,
    pub email: String,
}

impl BatchInputs {
    pub fn from_params(params: &ParameterSet) -> Result<Self> {
        Ok(Self {
            protein_name: params.text(&PROTEIN_NAME)?,
            account: params.text(&ACCOUNT)?,
            email: params.text(&EMAIL)?,
        })
    }

    pub fn schema() -> Vec<ParamInfo> {
        vec![PROTEIN_NAME.info(), ACCOUNT.info(), EMAIL.info()]
    }

    pub(crate) fn values(&self) -> [&str; 3] {
        [
            self.protein_name.as_str(),
            self.account.as_str(),
            self.email.as_str(),
        ]
    }
}

pub(crate) const BATCH_PLACEHOLDERS: [&str; 3] =
    ["{{ protein_name }}", "{{ account }}", "{{ email }}"];
