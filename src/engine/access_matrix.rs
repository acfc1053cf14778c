//! Inter-module access checks.
//!
//! The source module is the one the request says it comes from; the target
//! module is derived from the path. Either one missing means the request is
//! not cross-module traffic and is allowed.

use axum::http::Method;

use scolaguard_core::AuthzError;
use scolaguard_models::ModuleType;
use scolaguard_registry::AccessMatrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestIntent {
    Read,
    Write,
}

impl RequestIntent {
    pub fn from_method(method: &Method) -> Self {
        if *method == Method::GET || *method == Method::HEAD || *method == Method::OPTIONS {
            Self::Read
        } else {
            Self::Write
        }
    }
}

/// First path segment after `/api/` to the module owning it.
const PATH_MODULES: &[(&str, ModuleType)] = &[
    ("students", ModuleType::Scolarite),
    ("classes", ModuleType::Scolarite),
    ("scolarite", ModuleType::Scolarite),
    ("finances", ModuleType::Finances),
    ("fees", ModuleType::Finances),
    ("payments", ModuleType::Finances),
    ("exams", ModuleType::Examens),
    ("grades", ModuleType::Examens),
    ("communication", ModuleType::Communication),
    ("messages", ModuleType::Communication),
    ("notifications", ModuleType::Communication),
    ("attendance", ModuleType::Presences),
    ("timetable", ModuleType::EmploiDuTemps),
    ("schedules", ModuleType::EmploiDuTemps),
    ("library", ModuleType::Bibliotheque),
    ("transport", ModuleType::Transport),
    ("canteen", ModuleType::Cantine),
    ("staff", ModuleType::RessourcesHumaines),
    ("discipline", ModuleType::Discipline),
    ("infirmary", ModuleType::Infirmerie),
    ("enrollments", ModuleType::Inscriptions),
    ("admissions", ModuleType::Inscriptions),
    ("courses", ModuleType::Pedagogie),
    ("subjects", ModuleType::Pedagogie),
    ("parent-portal", ModuleType::PortailParents),
    ("events", ModuleType::Evenements),
    ("inventory", ModuleType::Inventaire),
    ("reports", ModuleType::Rapports),
    ("settings", ModuleType::Parametres),
    ("modules", ModuleType::Parametres),
    ("orientation", ModuleType::Orientation),
];

/// The module that owns `path`, if any.
pub fn target_module(path: &str) -> Option<ModuleType> {
    let segment = path
        .trim_start_matches('/')
        .strip_prefix("api/")?
        .split('/')
        .next()?;
    PATH_MODULES
        .iter()
        .find(|(prefix, _)| prefix.eq_ignore_ascii_case(segment))
        .map(|(_, module)| *module)
}

pub fn evaluate(
    matrix: &AccessMatrix,
    source: Option<ModuleType>,
    target: Option<ModuleType>,
    intent: RequestIntent,
) -> Result<(), AuthzError> {
    let (Some(source), Some(target)) = (source, target) else {
        return Ok(());
    };

    let Some(level) = matrix.level(source, target) else {
        return Err(AuthzError::AccessDenied(format!(
            "module {source} has no access to module {target}"
        )));
    };

    let allowed = match intent {
        RequestIntent::Read => level.allows_read(),
        RequestIntent::Write => level.allows_write(),
    };
    if !allowed {
        let verb = match intent {
            RequestIntent::Read => "read",
            RequestIntent::Write => "write",
        };
        return Err(AuthzError::AccessDenied(format!(
            "module {source} may not {verb} data of module {target}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scolaguard_models::AccessLevel;

    #[test]
    fn test_intent_from_method() {
        assert_eq!(RequestIntent::from_method(&Method::GET), RequestIntent::Read);
        assert_eq!(RequestIntent::from_method(&Method::HEAD), RequestIntent::Read);
        assert_eq!(RequestIntent::from_method(&Method::POST), RequestIntent::Write);
        assert_eq!(RequestIntent::from_method(&Method::DELETE), RequestIntent::Write);
    }

    #[test]
    fn test_target_module_from_path() {
        assert_eq!(target_module("/api/students/42"), Some(ModuleType::Scolarite));
        assert_eq!(target_module("/api/fees"), Some(ModuleType::Finances));
        assert_eq!(target_module("/api/health"), None);
        assert_eq!(target_module("/students"), None);
    }

    #[test]
    fn test_missing_module_allows() {
        let matrix = AccessMatrix::standard();
        assert!(evaluate(matrix, None, Some(ModuleType::Finances), RequestIntent::Write).is_ok());
        assert!(evaluate(matrix, Some(ModuleType::Cantine), None, RequestIntent::Write).is_ok());
    }

    #[test]
    fn test_absent_pair_denies_reads_and_writes() {
        let matrix = AccessMatrix::standard();
        for intent in [RequestIntent::Read, RequestIntent::Write] {
            let err = evaluate(
                matrix,
                Some(ModuleType::Cantine),
                Some(ModuleType::Examens),
                intent,
            )
            .unwrap_err();
            assert!(matches!(err, AuthzError::AccessDenied(_)));
        }
    }

    #[test]
    fn test_read_level_denies_writes_only() {
        let matrix = AccessMatrix::standard();
        let source = Some(ModuleType::Communication);
        let target = Some(ModuleType::Scolarite);

        assert!(evaluate(matrix, source, target, RequestIntent::Read).is_ok());
        assert!(evaluate(matrix, source, target, RequestIntent::Write).is_err());
    }

    #[test]
    fn test_explicit_none_entry_denies() {
        let matrix = AccessMatrix::builder()
            .grant(ModuleType::Transport, ModuleType::Rapports, AccessLevel::None)
            .build();
        assert!(
            evaluate(
                &matrix,
                Some(ModuleType::Transport),
                Some(ModuleType::Rapports),
                RequestIntent::Read
            )
            .is_err()
        );
    }

    #[test]
    fn test_same_module_is_read_write() {
        let matrix = AccessMatrix::standard();
        assert!(
            evaluate(
                matrix,
                Some(ModuleType::Finances),
                Some(ModuleType::Finances),
                RequestIntent::Write
            )
            .is_ok()
        );
    }
}
