use std::collections::BTreeMap;

/// One bin edge along a progress-coordinate axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Boundary {
    NegInf,
    Edge(f64),
    PosInf,
}

/// Relative archive path -> rendered text. Ordered so archives and listings
/// come out the same on every run.
pub type GeneratedArtifactSet = BTreeMap<String, String>;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum ArtifactKind {
    WestCfg,
    EnvSh,
    RunsegSh,
    RunCmdSh,
    RunWeSh,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 5] = [
        ArtifactKind::WestCfg,
        ArtifactKind::EnvSh,
        ArtifactKind::RunsegSh,
        ArtifactKind::RunCmdSh,
        ArtifactKind::RunWeSh,
    ];

    pub fn path(self) -> &'static str {
        match self {
            ArtifactKind::WestCfg => "west.cfg",
            ArtifactKind::EnvSh => "env.sh",
            ArtifactKind::RunsegSh => "westpa_scripts/runseg.sh",
            ArtifactKind::RunCmdSh => "cMD/run_cmd.sh",
            ArtifactKind::RunWeSh => "run_we.sh",
        }
    }

    pub fn file_name(self) -> &'static str {
        let path = self.path();
        path.rsplit('/').next().unwrap_or(path)
    }

    /// Accepts either the bare file name or the full relative path.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.path() == name || kind.file_name() == name)
    }
}
