//! End-to-end migration runs against a synthetic repository layout.

use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;

use modshift::{
    config::{Config, Options},
    graph::Orchestrator,
};

struct Repo {
    _dir: tempfile::TempDir,
    main: PathBuf,
}

impl Repo {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let main = dir.path().join("main");
        fs::create_dir_all(main.join("node_modules").join("@types").join("registrar")).unwrap();
        fs::write(
            main.join("node_modules")
                .join("@types")
                .join("registrar")
                .join("index.d.ts"),
            "declare namespace registrar {\n}\n",
        )
        .unwrap();
        Self { _dir: dir, main }
    }

    fn add_unit(&self, repo: &Path, name: &str, deps: &[&str]) {
        let unit = repo.join(name);
        fs::create_dir_all(unit.join("assets").join("ts")).unwrap();
        let entries: String = deps
            .iter()
            .map(|d| format!("    <orderEntry type=\"module\" module-name=\"{d}\" />\n"))
            .collect();
        fs::write(
            unit.join(format!("{name}.iml")),
            format!("<module>\n  <component>\n{entries}  </component>\n</module>\n"),
        )
        .unwrap();
    }

    fn write_source(&self, repo: &Path, unit: &str, file: &str, text: &str) {
        let path = repo.join(unit).join("assets").join("ts").join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    fn read_source(&self, repo: &Path, unit: &str, file: &str) -> String {
        fs::read_to_string(repo.join(unit).join("assets").join("ts").join(file)).unwrap()
    }

    fn run(&self, cwd: &Path, units: &[&str]) -> anyhow::Result<modshift::report::RunReport> {
        let options = Options {
            units: units.iter().map(|u| (*u).to_owned()).collect(),
            ..Options::default()
        };
        let config = Config::detect(options, cwd)?;
        Orchestrator::new(config).run()
    }
}

const PLATFORM_MAIN: &str = "\
module co.acme.platform {
    'use strict';

    registrar.module('platform.mod', [])
        .service('userService', UserService);

    export class UserService {
        static current(): string {
            return 'admin';
        }
    }
}
";

const WIDGETS_MAIN: &str = "\
module co.acme.widgets {
    'use strict';

    let MOD = registrar.module('widgets.mod', ['platform.mod']);
    MOD.controller('WidgetCtrl', WidgetCtrl);

    class WidgetCtrl {
        scope: registrar.IScope;
    }
}
";

fn seeded_repo() -> Repo {
    let repo = Repo::new();
    repo.add_unit(&repo.main, "platform", &[]);
    repo.add_unit(&repo.main, "widgets", &["platform"]);
    repo.write_source(&repo.main, "platform", "platform.ts", PLATFORM_MAIN);
    repo.write_source(&repo.main, "widgets", "widgets.ts", WIDGETS_MAIN);
    repo
}

#[test]
fn registration_chains_are_synthesized_declaratively() {
    let repo = seeded_repo();
    repo.run(&repo.main, &["widgets"]).unwrap();

    let migrated = repo.read_source(&repo.main, "widgets", "widgets.ts");
    assert!(!migrated.contains("module co.acme.widgets"));
    assert!(!migrated.contains("'use strict'"));
    assert!(migrated.contains(
        "registrar.module('widgets.mod', ['platform.mod']).controller('WidgetCtrl', WidgetCtrl);"
    ));
    assert!(migrated.contains("export class WidgetCtrl {"));
    assert!(migrated.contains("static CTRL_NAME = 'WidgetCtrl';"));
    assert!(migrated.contains("import { IScope } from 'registrar';"));
    assert!(migrated.contains("scope: IScope;"));

    // registrations captured in pass one survive into the synthesized chain
    // of every unit, not just the requested one
    let platform = repo.read_source(&repo.main, "platform", "platform.ts");
    assert!(platform.contains(
        "registrar.module('platform.mod', []).service('userService', UserService);"
    ));
}

#[test]
fn a_file_that_fails_to_parse_does_not_abort_the_unit() {
    let repo = seeded_repo();
    // the regex literal lexes as an unterminated string
    let broken = "module co.acme.widgets {\n    let re = /'/;\n}\n";
    repo.write_source(&repo.main, "widgets", "broken.ts", broken);

    let report = repo.run(&repo.main, &["widgets"]).unwrap();

    let migrated = repo.read_source(&repo.main, "widgets", "widgets.ts");
    assert!(migrated.contains(".controller('WidgetCtrl', WidgetCtrl)"));
    assert_eq!(repo.read_source(&repo.main, "widgets", "broken.ts"), broken);

    let widgets_report = report.units.iter().find(|u| u.unit == "widgets").unwrap();
    assert_eq!(widgets_report.transform_errors.len(), 1);
    assert!(
        widgets_report.transform_errors[0]
            .0
            .to_string_lossy()
            .ends_with("broken.ts")
    );
}

#[test]
fn qualified_cross_unit_references_become_alias_imports() {
    let repo = seeded_repo();
    repo.write_source(
        &repo.main,
        "widgets",
        "view.ts",
        "\
module co.acme.widgets {
    'use strict';

    export class View {
        user(): string {
            return co.acme.platform.UserService.current();
        }
    }
}
",
    );
    repo.run(&repo.main, &["widgets"]).unwrap();

    let migrated = repo.read_source(&repo.main, "widgets", "view.ts");
    assert!(migrated.contains("import { UserService } from '@platform/platform';"));
    assert!(migrated.contains("return UserService.current();"));
    assert!(!migrated.contains("co.acme.platform"));
}

#[test]
fn ambiguous_names_are_flagged_not_imported() {
    let repo = seeded_repo();
    repo.write_source(&repo.main, "widgets", "a.ts", "export class Helper {\n}\n");
    repo.write_source(&repo.main, "widgets", "b.ts", "export class Helper {\n}\n");
    repo.write_source(
        &repo.main,
        "widgets",
        "uses.ts",
        "\
module co.acme.widgets {
    export class Uses {
        helper: Helper;
    }
}
",
    );
    let report = repo.run(&repo.main, &["widgets"]).unwrap();

    let migrated = repo.read_source(&repo.main, "widgets", "uses.ts");
    assert!(!migrated.contains("import { Helper }"));
    let widgets_report = report
        .units
        .iter()
        .find(|u| u.unit == "widgets")
        .unwrap();
    assert_eq!(widgets_report.unresolved_imports.len(), 1);
    assert!(
        widgets_report.unresolved_imports[0]
            .to_string_lossy()
            .ends_with("uses.ts")
    );
}

#[test]
fn sub_repository_requires_a_migrated_base_unit() {
    let repo = seeded_repo();
    let extras = repo.main.parent().unwrap().join("extras");
    fs::create_dir_all(&extras).unwrap();
    fs::write(extras.join("parent-repos.json"), r#"{"main": {}}"#).unwrap();
    repo.add_unit(&extras, "reports", &["platform"]);
    repo.write_source(
        &extras,
        "reports",
        "reports.ts",
        "module co.acme.reports {\n    export class Report {\n    }\n}\n",
    );

    let err = repo.run(&extras, &["reports"]).unwrap_err();
    assert!(err.to_string().contains("not migrated"));

    // nothing was touched
    assert_eq!(
        repo.read_source(&extras, "reports", "reports.ts"),
        "module co.acme.reports {\n    export class Report {\n    }\n}\n"
    );
    assert!(!extras.join("reports").join("assets").join("ts-old").exists());
    assert!(
        !extras
            .join("reports")
            .join("assets")
            .join("ts")
            .join("tsconfig.json")
            .exists()
    );
}

#[test]
fn migration_backs_up_sources_and_writes_the_marker() {
    let repo = seeded_repo();
    fs::write(
        repo.main
            .join("widgets")
            .join("assets")
            .join("ts")
            .join("tscommand.txt"),
        "legacy\n",
    )
    .unwrap();
    repo.run(&repo.main, &["widgets"]).unwrap();

    let assets = repo.main.join("widgets").join("assets");
    assert_eq!(
        fs::read_to_string(assets.join("ts-old").join("widgets.ts")).unwrap(),
        WIDGETS_MAIN
    );
    assert!(!assets.join("ts").join("tscommand.txt").exists());

    let tsconfig = fs::read_to_string(assets.join("ts").join("tsconfig.json")).unwrap();
    assert!(tsconfig.contains("\"@platform/*\""));
    assert!(tsconfig.contains("../../../platform/assets/ts/*"));

    // the base unit was migrated first and carries no path aliases
    let platform_tsconfig = fs::read_to_string(
        repo.main
            .join("platform")
            .join("assets")
            .join("ts")
            .join("tsconfig.json"),
    )
    .unwrap();
    assert!(!platform_tsconfig.contains("paths"));
}

#[test]
fn second_run_skips_migrated_units_and_changes_nothing() {
    let repo = seeded_repo();
    repo.run(&repo.main, &["widgets"]).unwrap();
    let first_widgets = repo.read_source(&repo.main, "widgets", "widgets.ts");
    let first_platform = repo.read_source(&repo.main, "platform", "platform.ts");

    let report = repo.run(&repo.main, &["widgets"]).unwrap();
    assert!(report.units.is_empty());
    assert!(report.skipped_migrated.contains(&"widgets".to_owned()));
    assert!(report.skipped_migrated.contains(&"platform".to_owned()));
    assert_eq!(repo.read_source(&repo.main, "widgets", "widgets.ts"), first_widgets);
    assert_eq!(
        repo.read_source(&repo.main, "platform", "platform.ts"),
        first_platform
    );
}
