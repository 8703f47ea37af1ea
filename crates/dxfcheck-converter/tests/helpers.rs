//! Shared helpers for harness integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use dxf::Drawing;
use dxf::entities::{Circle, Entity, EntityType, Line};
use dxfcheck_core::config::AppConfig;

/// A temporary fixtures directory plus a stand-in for the external tool.
pub struct TestFixtures {
    pub dir: tempfile::TempDir,
    pub tool: PathBuf,
}

impl TestFixtures {
    /// Fixtures directory with `circle.dxf` and `square.dxf`.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        write_square(&dir.path().join("square.dxf"));
        write_circle(&dir.path().join("circle.dxf"));
        let tool = dir.path().join("bin").join("fake-dxf2precitec");
        Self { dir, tool }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Install a tool script that writes its preview and geometry outputs,
    /// exiting with `code` instead when the input path contains `fail_on`.
    pub fn install_tool(&self, fail_on: Option<(&str, i32)>) {
        let failure = match fail_on {
            Some((needle, code)) => format!("case \"$8\" in *{needle}*) exit {code};; esac\n"),
            None => String::new(),
        };
        let script = format!(
            "#!/bin/sh\n\
             [ \"$1\" = \"-svg\" ] || exit 64\n\
             [ \"$7\" = \"--\" ] || exit 64\n\
             {failure}\
             printf '<svg xmlns=\"http://www.w3.org/2000/svg\"/>\\n' > \"$2\"\n\
             printf '{{\"epsilon\":\"%s\"}}\\n' \"$4\" > \"$9\"\n"
        );
        write_executable(&self.tool, &script);
    }

    /// Configuration pointing the harness at this directory and tool.
    pub fn config(&self) -> AppConfig {
        let mut config = AppConfig::default();
        config.harness.fixtures_dir = Some(self.path().to_path_buf());
        config.tool.executable = self.tool.clone();
        config
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path().join(name).is_file()
    }

    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.path().join(name)).expect("Failed to read artifact")
    }
}

fn write_square(path: &Path) {
    let mut drawing = Drawing::new();
    let corners = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
    for i in 0..corners.len() {
        let (x1, y1) = corners[i];
        let (x2, y2) = corners[(i + 1) % corners.len()];
        drawing.add_entity(Entity::new(EntityType::Line(Line {
            p1: dxf::Point::new(x1, y1, 0.0),
            p2: dxf::Point::new(x2, y2, 0.0),
            ..Default::default()
        })));
    }
    drawing.save_file(path).expect("Failed to save square.dxf");
}

fn write_circle(path: &Path) {
    let mut drawing = Drawing::new();
    drawing.add_entity(Entity::new(EntityType::Circle(Circle {
        center: dxf::Point::new(5.0, 5.0, 0.0),
        radius: 5.0,
        ..Default::default()
    })));
    drawing.save_file(path).expect("Failed to save circle.dxf");
}

#[cfg(unix)]
fn write_executable(path: &Path, contents: &str) {
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create bin dir");
    }
    {
        let mut file = std::fs::File::create(path).expect("Failed to create script");
        file.write_all(contents.as_bytes()).expect("Failed to write script");
        file.sync_all().expect("Failed to sync script");
    }
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .expect("Failed to chmod script");
}

#[cfg(not(unix))]
fn write_executable(_path: &Path, _contents: &str) {}
