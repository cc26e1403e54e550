use crate::report::{BATCH_PLACEHOLDERS, BatchInputs, placeholder_matcher, substitute};
use aho_corasick::AhoCorasick;
use std::sync::OnceLock;

/// Conventional MD job that produces the GaMD restart for the ensemble run.
pub fn render(inputs: &BatchInputs) -> String {
    substitute(matcher(), TEMPLATE, inputs.values())
}

fn matcher() -> &'static AhoCorasick {
    static AC: OnceLock<AhoCorasick> = OnceLock::new();
    AC.get_or_init(|| placeholder_matcher(&BATCH_PLACEHOLDERS))
}

/// Lines carry no trailing spaces and the text ends with one newline.
const TEMPLATE: &str = r#"#!/bin/bash
#SBATCH --job-name="{{ protein_name }}_GaMD"
#SBATCH --output="job.out"
#SBATCH --partition=gpu-shared
#SBATCH --nodes=1
#SBATCH --gpus=1
#SBATCH --ntasks-per-node=1
#SBATCH --mem=50G
#SBATCH --account={{ account }}
#SBATCH --no-requeue
#SBATCH --mail-user={{ email }}
#SBATCH --mail-type=ALL
#SBATCH -t 48:00:00

module purge
module load shared
module load gpu/0.15.4
module load slurm
module load openmpi/4.0.4
module load cuda/11.0.2
module load amber/20

export PATH=$PATH:$HOME/bin
export LD_LIBRARY_PATH=$LD_LIBRARY_PATH
source $AMBERHOME/amber.sh
pmemd.cuda -O -i md.in -o md.out -p {{ protein_name }}.prmtop -c {{ protein_name }}.rst -r md_cmd.rst -x md.nc
"#;
