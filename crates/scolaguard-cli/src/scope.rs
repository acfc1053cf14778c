use scolaguard_models::{
    ModuleType,
    ids::{SchoolLevelId, TenantId},
};

/// Parses a tenant and school level given on the command line.
pub fn parse_scope(tenant: &str, level: &str) -> Result<(TenantId, SchoolLevelId), String> {
    let tenant = tenant
        .trim()
        .parse()
        .map_err(|_| format!("Invalid tenant id: {tenant}"))?;
    let level = level
        .trim()
        .parse()
        .map_err(|_| format!("Invalid school level id: {level}"))?;
    Ok((tenant, level))
}

pub fn parse_module(module: &str) -> Result<ModuleType, String> {
    module.parse().map_err(|e| {
        let known: Vec<&str> = ModuleType::ALL.iter().map(ModuleType::as_str).collect();
        format!("{e} (expected one of: {})", known.join(", "))
    })
}

/// Comma separated role names, lowercased.
pub fn parse_roles(roles: &str) -> Vec<String> {
    roles
        .split(',')
        .map(|r| r.trim().to_lowercase())
        .filter(|r| !r.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scope() {
        let tenant = TenantId::new();
        let level = SchoolLevelId::new();

        let parsed = parse_scope(&tenant.to_string(), &format!(" {level} ")).unwrap();
        assert_eq!(parsed, (tenant, level));
        assert!(parse_scope("nope", &level.to_string()).is_err());
    }

    #[test]
    fn test_parse_module_lists_known_names_on_error() {
        assert_eq!(parse_module("cantine"), Ok(ModuleType::Cantine));
        let err = parse_module("gym").unwrap_err();
        assert!(err.contains("SCOLARITE"));
    }

    #[test]
    fn test_parse_roles() {
        assert_eq!(
            parse_roles("Admin, ,teacher"),
            vec!["admin".to_string(), "teacher".to_string()]
        );
    }
}
