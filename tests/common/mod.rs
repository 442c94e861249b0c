//! Shared test infrastructure for integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Scratch directory holding a small CFG corpus and command outputs.
pub struct Fixture {
    pub dir: TempDir,
}

/// Result of one `cfgkw` invocation.
#[derive(Debug)]
pub struct RunResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl From<Output> for RunResult {
    fn from(output: Output) -> Self {
        RunResult {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

impl Fixture {
    pub fn new() -> Self {
        Fixture {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn write(&self, rel: &str, text: &str) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create fixture dir");
        }
        fs::write(&path, text).expect("write fixture file");
        path
    }

    /// Run the binary with `args`, resolving nothing: callers pass full paths.
    pub fn run<I, S>(&self, args: I) -> RunResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        Command::new(env!("CARGO_BIN_EXE_cfgkw"))
            .args(args)
            .env_remove("RUST_LOG")
            .current_dir(self.dir.path())
            .output()
            .expect("spawn cfgkw")
            .into()
    }

    pub fn read_json(&self, path: &Path) -> serde_json::Value {
        let bytes = fs::read(path).expect("read output");
        serde_json::from_slice(&bytes).expect("parse output JSON")
    }

    /// Two-dialect corpus: one LS-DYNA material (with a variant name), one
    /// Radioss property, a file in an unrecognized directory and a hierarchy
    /// file per version.
    pub fn write_corpus(&self) -> PathBuf {
        self.write(
            "cfg/Keyword971/MAT/mat_elastic.cfg",
            r#"
ATTRIBUTES(COMMON)
{
    E  = VALUE(FLOAT, "Young's modulus");
    PR = VALUE(FLOAT, "Poisson's ratio");
    _HAS_TITLE = VALUE(INT, "Title flag");
}
DEFAULTS(COMMON)
{
    PR = 0.3;
}
GUI(COMMON)
{
    ASSIGN(KEYWORD_STR, "*MAT_ELASTIC");
    ASSIGN(KEYWORD_STR, "*MAT_001");
mandatory:
    SCALAR(E) { DIMENSION = "pressure"; }
optional:
    SCALAR(PR);
}
FORMAT(Keyword971)
{
    HEADER("*MAT_ELASTIC");
    COMMENT("$      MID        RO         E        PR");
    CARD("%10d%10lg%10lg%10lg", _ID_, RHO, E, PR);
}
"#,
        );
        self.write(
            "cfg/radioss2022/PROP/prop_shell.cfg",
            r#"
ATTRIBUTES(COMMON)
{
    THICK = VALUE(FLOAT, "Shell thickness");
}
"#,
        );
        self.write("cfg/other/notes.cfg", "ATTRIBUTES { A = VALUE(INT); }");
        self.write(
            "cfg/Keyword971/data_hierarchy.cfg",
            r#"
HIERARCHY
{
    KEYWORD = MATERIALS;
    HIERARCHY
    {
        FILE = "MAT/mat_elastic.cfg";
        USER_NAMES = (MAT_ELASTIC, "MAT_001", "MAT,QUOTED");
    }
}
"#,
        );
        self.write(
            "cfg/Keyword971_R11/data_hierarchy.cfg",
            r#"
HIERARCHY
{
    FILE = "materials/mat_elastic_r11.cfg";
    USER_NAMES = (MAT_ELASTIC, MAT_ELASTIC_FLUID);
}
"#,
        );
        self.path("cfg")
    }
}
