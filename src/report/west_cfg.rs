use crate::core::bins::{axis_boundaries, format_boundaries};
use crate::core::engine::pcoord_len;
use crate::core::error::Result;
use crate::core::model::Boundary;
use crate::core::params::{
    BIN_TARGET_COUNTS, INCLUDE_INFINITE_BOUNDS, MAX_TOTAL_ITERATIONS, NSTLIM, NTPR, PC1_MAX,
    PC1_MIN, PC1_STEP, PC2_MAX, PC2_MIN, PC2_STEP, ParamInfo, ParameterSet,
};
use crate::report::{placeholder_matcher, substitute};
use aho_corasick::AhoCorasick;
use std::sync::OnceLock;

#[derive(Clone, Debug, PartialEq)]
pub struct WestCfgInputs {
    pub pcoord_len: i64,
    pub pc1_bins: Vec<Boundary>,
    pub pc2_bins: Vec<Boundary>,
    pub bin_target_counts: i64,
    pub max_total_iterations: i64,
}

impl WestCfgInputs {
    pub fn from_params(params: &ParameterSet) -> Result<Self> {
        let include_inf = params.flag(&INCLUDE_INFINITE_BOUNDS)?;
        let pc1_bins = axis_boundaries(
            "pc1",
            params.float(&PC1_MIN)?,
            params.float(&PC1_MAX)?,
            params.float(&PC1_STEP)?,
            include_inf,
        )?;
        let pc2_bins = axis_boundaries(
            "pc2",
            params.float(&PC2_MIN)?,
            params.float(&PC2_MAX)?,
            params.float(&PC2_STEP)?,
            include_inf,
        )?;
        Ok(Self {
            pcoord_len: pcoord_len(params.integer(&NSTLIM)?, params.integer(&NTPR)?),
            pc1_bins,
            pc2_bins,
            bin_target_counts: params.integer(&BIN_TARGET_COUNTS)?,
            max_total_iterations: params.integer(&MAX_TOTAL_ITERATIONS)?,
        })
    }
}

pub fn schema() -> Vec<ParamInfo> {
    vec![
        PC1_MIN.info(),
        PC1_MAX.info(),
        PC1_STEP.info(),
        PC2_MIN.info(),
        PC2_MAX.info(),
        PC2_STEP.info(),
        INCLUDE_INFINITE_BOUNDS.info(),
        NSTLIM.info(),
        NTPR.info(),
        BIN_TARGET_COUNTS.info(),
        MAX_TOTAL_ITERATIONS.info(),
    ]
}

pub fn render(inputs: &WestCfgInputs) -> String {
    let pcoord_len = inputs.pcoord_len.to_string();
    let pc1 = format_boundaries(&inputs.pc1_bins);
    let pc2 = format_boundaries(&inputs.pc2_bins);
    let counts = inputs.bin_target_counts.to_string();
    let iterations = inputs.max_total_iterations.to_string();
    substitute(
        matcher(),
        TEMPLATE,
        [
            pcoord_len.as_str(),
            pc1.as_str(),
            pc2.as_str(),
            counts.as_str(),
            iterations.as_str(),
        ],
    )
}

const PLACEHOLDERS: [&str; 5] = [
    "{{ pcoord_len }}",
    "{{ pc1_bins }}",
    "{{ pc2_bins }}",
    "{{ bin_target_counts }}",
    "{{ max_total_iterations }}",
];

fn matcher() -> &'static AhoCorasick {
    static AC: OnceLock<AhoCorasick> = OnceLock::new();
    AC.get_or_init(|| placeholder_matcher(&PLACEHOLDERS))
}

/// Lines carry no trailing spaces and the text ends with one newline.
const TEMPLATE: &str = r#"# The master WEST configuration file for a simulation.
# vi: set filetype=yaml :
---
west:
  system:
    driver: westpa.core.systems.WESTSystem
    system_options:
      # Dimensionality of your progress coordinate
      pcoord_ndim: 2
      # Number of data points per iteration
      # Needs to be pcoord_len >= 2 (minimum of parent, last frame) to work with most analysis tools
      pcoord_len: {{ pcoord_len }}
      # Data type for your progress coordinate
      pcoord_dtype: !!python/name:numpy.float32
      bins:
        type: RectilinearBinMapper
        # The edges of the bins
        boundaries:
          - {{ pc1_bins }}
          - {{ pc2_bins }}
      # Number walkers per bin
      bin_target_counts: {{ bin_target_counts }}
  propagation:
    max_total_iterations: {{ max_total_iterations }}
    max_run_wallclock:    47:30:00
    propagator:           executable
    gen_istates:          false
  data:
    west_data_file: west.h5
    datasets:
      - name:        pcoord
        scaleoffset: 4
      - name:        coord
        dtype:       float32
        scaleoffset: 3
    data_refs:
      segment:       $WEST_SIM_ROOT/traj_segs/{segment.n_iter:06d}/{segment.seg_id:06d}
      basis_state:   $WEST_SIM_ROOT/bstates/{basis_state.auxref}
      initial_state: $WEST_SIM_ROOT/istates/{initial_state.iter_created}/{initial_state.state_id}.rst
  plugins:
  executable:
    environ:
      PROPAGATION_DEBUG: 1
    datasets:
      - name:    coord
        enabled: false
    propagator:
      executable: $WEST_SIM_ROOT/westpa_scripts/runseg.sh
      stdout:     $WEST_SIM_ROOT/seg_logs/{segment.n_iter:06d}-{segment.seg_id:06d}.log
      stderr:     stdout
      stdin:      null
      cwd:        null
      environ:
        SEG_DEBUG: 1
    get_pcoord:
      executable: $WEST_SIM_ROOT/westpa_scripts/get_pcoord.sh
      stdout:     /dev/null
      stderr:     stdout
    gen_istate:
      executable: $WEST_SIM_ROOT/westpa_scripts/gen_istate.sh
      stdout:     /dev/null
      stderr:     stdout
    post_iteration:
      enabled:    true
      executable: $WEST_SIM_ROOT/westpa_scripts/post_iter.sh
      stderr:     stdout
    pre_iteration:
      enabled:    false
      executable: $WEST_SIM_ROOT/westpa_scripts/pre_iter.sh
      stderr:     stdout
"#;
