use crate::core::error::{GenerateError, Result};
use crate::core::model::{ArtifactKind, GeneratedArtifactSet};
use crate::core::params::{ParamInfo, ParameterSet};
use crate::report::{BatchInputs, env_sh, run_cmd_sh, run_we_sh, runseg_sh, west_cfg};
use tracing::debug;

/// Progress-coordinate samples per iteration: one per `ntpr` steps plus the
/// parent frame. Non-positive `ntpr` counts as 1.
pub fn pcoord_len(nstlim: i64, ntpr: i64) -> i64 {
    let ntpr = if ntpr <= 0 { 1 } else { ntpr };
    nstlim.div_euclid(ntpr).saturating_add(1)
}

/// Renders one artifact. Both the full bundle and previews go through here,
/// so derived values are computed identically on either path.
pub fn render_artifact(kind: ArtifactKind, params: &ParameterSet) -> Result<String> {
    let text = match kind {
        ArtifactKind::WestCfg => west_cfg::render(&west_cfg::WestCfgInputs::from_params(params)?),
        ArtifactKind::EnvSh => env_sh::render(),
        ArtifactKind::RunsegSh => {
            runseg_sh::render(&runseg_sh::RunsegInputs::from_params(params)?)
        }
        ArtifactKind::RunCmdSh => run_cmd_sh::render(&BatchInputs::from_params(params)?),
        ArtifactKind::RunWeSh => run_we_sh::render(&BatchInputs::from_params(params)?),
    };
    debug!(artifact = kind.path(), bytes = text.len(), "rendered artifact");
    Ok(text)
}

/// Renders every artifact into a fresh map keyed by archive path.
pub fn generate_configs(params: &ParameterSet) -> Result<GeneratedArtifactSet> {
    let mut configs = GeneratedArtifactSet::new();
    for kind in ArtifactKind::ALL {
        configs.insert(kind.path().to_string(), render_artifact(kind, params)?);
    }
    Ok(configs)
}

pub fn preview(name: &str, params: &ParameterSet) -> Result<String> {
    let kind = ArtifactKind::from_name(name)
        .ok_or_else(|| GenerateError::UnknownArtifact(name.to_string()))?;
    render_artifact(kind, params)
}

pub fn schema(kind: ArtifactKind) -> Vec<ParamInfo> {
    match kind {
        ArtifactKind::WestCfg => west_cfg::schema(),
        ArtifactKind::EnvSh => Vec::new(),
        ArtifactKind::RunsegSh => runseg_sh::schema(),
        ArtifactKind::RunCmdSh | ArtifactKind::RunWeSh => BatchInputs::schema(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: serde_json::Value) -> ParameterSet {
        ParameterSet::from_value(value).unwrap()
    }

    fn pcoord_line(text: &str) -> &str {
        text.lines()
            .find(|l| l.trim_start().starts_with("pcoord_len:"))
            .map(str::trim)
            .unwrap()
    }

    #[test]
    fn pcoord_len_examples() {
        assert_eq!(pcoord_len(50_000, 500), 101);
        assert_eq!(pcoord_len(50_000, 0), 50_001);
        assert_eq!(pcoord_len(50_000, -20), 50_001);
        assert_eq!(pcoord_len(999, 500), 2);
        assert_eq!(pcoord_len(-1, 500), 0);
    }

    #[test]
    fn full_set_has_every_fixed_path() {
        let configs = generate_configs(&ParameterSet::new()).unwrap();
        let keys: Vec<_> = configs.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "cMD/run_cmd.sh",
                "env.sh",
                "run_we.sh",
                "west.cfg",
                "westpa_scripts/runseg.sh"
            ]
        );
        assert!(configs.values().all(|text| !text.is_empty()));
    }

    #[test]
    fn pcoord_len_agrees_between_full_and_preview() {
        for (nstlim, ntpr) in [
            (json!(50_000), json!(500)),
            (json!(50_000), json!(0)),
            (json!(12_345), json!(-7)),
            (json!("7000"), json!("300")),
        ] {
            let p = params(json!({ "nstlim": nstlim, "ntpr": ntpr }));
            let full = generate_configs(&p).unwrap();
            let single = preview("west.cfg", &p).unwrap();
            assert_eq!(pcoord_line(&full["west.cfg"]), pcoord_line(&single));
        }
        let p = params(json!({ "nstlim": 50_000, "ntpr": 500 }));
        assert_eq!(pcoord_line(&preview("west.cfg", &p).unwrap()), "pcoord_len: 101");
    }

    #[test]
    fn preview_matches_bundle_entry() {
        let p = params(json!({
            "protein_name": "trpcage",
            "account": "abc123",
            "email": "me@lab.org",
            "enable_gpu_parallelization": false,
        }));
        let full = generate_configs(&p).unwrap();
        for kind in ArtifactKind::ALL {
            assert_eq!(preview(kind.path(), &p).unwrap(), full[kind.path()]);
            assert_eq!(preview(kind.file_name(), &p).unwrap(), full[kind.path()]);
        }
    }

    #[test]
    fn unknown_preview_name_is_reported() {
        let err = preview("md.in", &ParameterSet::new()).unwrap_err();
        assert!(matches!(err, GenerateError::UnknownArtifact(ref n) if n == "md.in"));
        assert_eq!(err.to_string(), "Configuration file md.in not found");
    }

    #[test]
    fn uncoercible_required_value_fails_full_generation() {
        let p = params(json!({ "nstlim": "lots" }));
        let err = generate_configs(&p).unwrap_err();
        assert!(matches!(err, GenerateError::Coercion { name: "nstlim", .. }));
        assert!(preview("west.cfg", &p).is_err());
        assert!(preview("env.sh", &p).is_ok());
    }

    #[test]
    fn oversized_axis_fails_instead_of_allocating() {
        let p = params(json!({ "pc2_max": 1.0e12, "pc2_step": 0.001 }));
        let err = generate_configs(&p).unwrap_err();
        assert!(matches!(err, GenerateError::TooManyBins { axis: "pc2", .. }));
    }

    #[test]
    fn fine_step_under_cap_still_renders() {
        let p = params(json!({ "pc1_max": 8, "pc1_step": 1e-5 }));
        let configs = generate_configs(&p).unwrap();
        assert!(configs["west.cfg"].contains("1e-05"));
    }

    #[test]
    fn rendered_files_have_clean_line_endings() {
        for (path, text) in generate_configs(&ParameterSet::new()).unwrap() {
            assert!(text.ends_with('\n') && !text.ends_with("\n\n"), "{path}");
            assert!(
                text.lines().all(|line| line == line.trim_end()),
                "{path} has trailing whitespace"
            );
        }
    }

    #[test]
    fn every_artifact_declares_its_parameters() {
        assert!(schema(ArtifactKind::EnvSh).is_empty());
        let names: Vec<_> = schema(ArtifactKind::RunCmdSh).iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["protein_name", "account", "email"]);
        assert!(schema(ArtifactKind::WestCfg).iter().any(|p| p.name == "ntpr"));
    }
}
