use crate::core::error::Result;
use crate::core::params::{ENABLE_GPU_PARALLELIZATION, PROTEIN_NAME, ParamInfo, ParameterSet};
use crate::report::{placeholder_matcher, substitute};
use aho_corasick::AhoCorasick;
use std::sync::OnceLock;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunsegInputs {
    pub protein_name: String,
    pub enable_gpu_parallelization: bool,
}

impl RunsegInputs {
    pub fn from_params(params: &ParameterSet) -> Result<Self> {
        Ok(Self {
            protein_name: params.text(&PROTEIN_NAME)?,
            enable_gpu_parallelization: params.flag(&ENABLE_GPU_PARALLELIZATION)?,
        })
    }
}

pub fn schema() -> Vec<ParamInfo> {
    vec![PROTEIN_NAME.info(), ENABLE_GPU_PARALLELIZATION.info()]
}

pub fn render(inputs: &RunsegInputs) -> String {
    let mut body = String::with_capacity(SETUP.len() + GPU_BLOCK.len() + PROPAGATE.len());
    body.push_str(SETUP);
    if inputs.enable_gpu_parallelization {
        body.push_str(GPU_BLOCK);
    }
    body.push_str(PROPAGATE);
    substitute(matcher(), &body, [inputs.protein_name.as_str()])
}

const PLACEHOLDERS: [&str; 1] = ["{{ protein_name }}"];

fn matcher() -> &'static AhoCorasick {
    static AC: OnceLock<AhoCorasick> = OnceLock::new();
    AC.get_or_init(|| placeholder_matcher(&PLACEHOLDERS))
}

/// Lines carry no trailing spaces and the text ends with one newline.
const SETUP: &str = r#"#!/bin/bash

if [ -n "$SEG_DEBUG" ] ; then
  set -x
  env | sort
fi

cd $WEST_SIM_ROOT
mkdir -pv $WEST_CURRENT_SEG_DATA_REF
cd $WEST_CURRENT_SEG_DATA_REF

ln -sv $WEST_SIM_ROOT/common_files/{{ protein_name }}.prmtop .
ln -sv $WEST_SIM_ROOT/common_files/gamd-restart.dat .

if [ "$WEST_CURRENT_SEG_INITPOINT_TYPE" = "SEG_INITPOINT_CONTINUES" ]; then
  sed "s/RAND/$WEST_RAND16/g" $WEST_SIM_ROOT/common_files/md.in > md.in
  ln -sv $WEST_PARENT_DATA_REF/seg.rst ./parent.rst
elif [ "$WEST_CURRENT_SEG_INITPOINT_TYPE" = "SEG_INITPOINT_NEWTRAJ" ]; then
  sed "s/RAND/$WEST_RAND16/g" $WEST_SIM_ROOT/common_files/md_init.in > md.in
  ln -sv $WEST_PARENT_DATA_REF ./parent.rst
fi

"#;

// One GPU per worker process, picked from the allocated list by WM index.
const GPU_BLOCK: &str = r#"export CUDA_DEVICES=(`echo $CUDA_VISIBLE_DEVICES_ALLOCATED | tr , ' '`)
export CUDA_VISIBLE_DEVICES=${CUDA_DEVICES[$WM_PROCESS_INDEX]}

echo "RUNSEG.SH: CUDA_VISIBLE_DEVICES_ALLOCATED = " $CUDA_VISIBLE_DEVICES_ALLOCATED
echo "RUNSEG.SH: WM_PROCESS_INDEX = " $WM_PROCESS_INDEX
echo "RUNSEG.SH: CUDA_VISIBLE_DEVICES = " $CUDA_VISIBLE_DEVICES

"#;

const PROPAGATE: &str = r#"while ! grep -q "Final Performance Info" seg.log; do
	$PMEMD -O -i md.in   -p {{ protein_name }}.prmtop  -c parent.rst \
          -r seg.rst -x seg.nc      -o seg.log    -inf seg.nfo -gamd gamd.log
done

RMSD=rmsd.dat
RG=rg.dat
COMMAND="         parm {{ protein_name }}.prmtop\n"
COMMAND="${COMMAND} trajin $WEST_CURRENT_SEG_DATA_REF/parent.rst\n"
COMMAND="${COMMAND} trajin $WEST_CURRENT_SEG_DATA_REF/seg.nc\n"
COMMAND="${COMMAND} reference $WEST_SIM_ROOT/common_files/{{ protein_name }}.pdb\n"
COMMAND="${COMMAND} rms ca-rmsd @CA reference out $RMSD mass\n"
COMMAND="${COMMAND} radgyr ca-rg @CA  out $RG  mass\n"
COMMAND="${COMMAND} go\n"

echo -e $COMMAND | $CPPTRAJ
#cat $RMSD > rmsd.dat
#cat $RG > rg.dat
paste <(cat rmsd.dat | tail -n +2 | awk {'print $2'}) <(cat rg.dat | tail -n +2 | awk {'print $2'})>$WEST_PCOORD_RETURN
#cat $TEMP | tail -n +2 | awk '{print $2}' > $WEST_PCOORD_RETURN
#paste <(cat $TEMP | tail -n 1 | awk {'print $2'}) <(cat $RG | tail -n 1 | awk {'print $2'})>$WEST_PCOORD_RETURN
#cat $TEMP >pcoord.dat
# Clean up
rm -f $TEMP md.in seg.nfo seg.pdb
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(gpu: bool) -> RunsegInputs {
        RunsegInputs {
            protein_name: "chignolin".to_string(),
            enable_gpu_parallelization: gpu,
        }
    }

    #[test]
    fn protein_name_reaches_every_file_reference() {
        let text = render(&inputs(true));
        assert!(text.contains("common_files/chignolin.prmtop ."));
        assert!(text.contains("-p chignolin.prmtop  -c parent.rst \\\n"));
        assert!(text.contains("parm chignolin.prmtop\\n\""));
        assert!(text.contains("common_files/chignolin.pdb\\n\""));
        assert!(!text.contains("{{"));
    }

    #[test]
    fn gpu_block_is_omitted_when_disabled() {
        let on = render(&inputs(true));
        let off = render(&inputs(false));
        assert!(on.contains("CUDA_VISIBLE_DEVICES=${CUDA_DEVICES[$WM_PROCESS_INDEX]}"));
        assert!(!off.contains("CUDA_DEVICES"));
        assert!(!off.contains("WM_PROCESS_INDEX"));
        assert_eq!(on.len(), off.len() + GPU_BLOCK.len());
        assert!(off.contains("fi\n\nwhile ! grep"));
    }

    #[test]
    fn defaults_enable_gpu_block() {
        let params = ParameterSet::new();
        let text = render(&RunsegInputs::from_params(&params).unwrap());
        assert!(text.contains("CUDA_DEVICES"));
        assert!(text.contains("common_files/protein.prmtop"));
    }
}
