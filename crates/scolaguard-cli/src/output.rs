use scolaguard_models::{AccessLevel, AccessMatrixEntry, Module};

pub fn modules_table(modules: &[Module]) -> String {
    let mut out = format!(
        "{:<22} {:<8} {:<12} {}\n",
        "MODULE", "ENABLED", "STATUS", "DEPENDENCIES"
    );
    for module in modules {
        let dependencies: Vec<&str> = module.dependencies.iter().map(|d| d.as_str()).collect();
        out.push_str(&format!(
            "{:<22} {:<8} {:<12} {}\n",
            module.module_type.as_str(),
            if module.enabled { "yes" } else { "no" },
            module.status.as_str(),
            if dependencies.is_empty() {
                "-".to_string()
            } else {
                dependencies.join(", ")
            }
        ));
    }
    out
}

/// Cross-module entries only; every module has full access to itself.
pub fn matrix_table(entries: &[AccessMatrixEntry]) -> String {
    let mut out = format!("{:<22} {:<22} {}\n", "SOURCE", "TARGET", "ACCESS");
    for entry in entries.iter().filter(|e| e.source != e.target) {
        out.push_str(&format!(
            "{:<22} {:<22} {}\n",
            entry.source.as_str(),
            entry.target.as_str(),
            level_label(entry.level)
        ));
    }
    out
}

fn level_label(level: AccessLevel) -> &'static str {
    match level {
        AccessLevel::None => "NONE",
        AccessLevel::Read => "READ",
        AccessLevel::ReadWrite => "READ_WRITE",
    }
}
