//! Default module definitions.
//!
//! Seeded for every new (tenant, school level) by
//! [`ModuleRegistry::initialize_defaults`](crate::ModuleRegistry::initialize_defaults).
//! The core academic modules start enabled; optional services start disabled
//! until a school turns them on.

use scolaguard_core::permissions;
use scolaguard_models::{
    ModuleType, NewModule,
    ids::{SchoolLevelId, TenantId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleDefinition {
    pub module_type: ModuleType,
    pub enabled_by_default: bool,
    pub dependencies: &'static [ModuleType],
    pub required_permissions: &'static [&'static str],
}

impl ModuleDefinition {
    pub fn to_new_module(
        &self,
        tenant_id: TenantId,
        school_level_id: SchoolLevelId,
        enabled: bool,
    ) -> NewModule {
        NewModule {
            tenant_id,
            school_level_id,
            module_type: self.module_type,
            enabled,
            dependencies: self.dependencies.to_vec(),
            required_permissions: self
                .required_permissions
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

const fn def(
    module_type: ModuleType,
    enabled_by_default: bool,
    dependencies: &'static [ModuleType],
    required_permissions: &'static [&'static str],
) -> ModuleDefinition {
    ModuleDefinition {
        module_type,
        enabled_by_default,
        dependencies,
        required_permissions,
    }
}

use ModuleType::*;

static DEFINITIONS: [ModuleDefinition; 20] = [
    def(Scolarite, true, &[], &[permissions::STUDENTS_READ]),
    def(
        Finances,
        true,
        &[Scolarite, Inscriptions],
        &[permissions::FINANCES_READ],
    ),
    def(Examens, true, &[Scolarite, Pedagogie], &[permissions::EXAMS_READ]),
    def(Communication, true, &[], &[]),
    def(
        Presences,
        true,
        &[Scolarite, EmploiDuTemps],
        &[permissions::ATTENDANCE_READ],
    ),
    def(EmploiDuTemps, true, &[Scolarite], &[permissions::TIMETABLE_READ]),
    def(Bibliotheque, false, &[Scolarite], &[]),
    def(Transport, false, &[Scolarite, Finances], &[]),
    def(Cantine, false, &[Scolarite, Finances], &[]),
    def(RessourcesHumaines, false, &[], &[permissions::STAFF_MANAGE]),
    def(Discipline, false, &[Scolarite, Presences], &[]),
    def(Infirmerie, false, &[Scolarite], &[]),
    def(Inscriptions, true, &[], &[]),
    def(Pedagogie, true, &[Scolarite], &[]),
    def(PortailParents, false, &[Scolarite, Communication], &[]),
    def(Evenements, false, &[Communication], &[]),
    def(Inventaire, false, &[Finances], &[]),
    def(Rapports, true, &[Scolarite], &[permissions::REPORTS_READ]),
    def(Parametres, true, &[], &[permissions::SETTINGS_MANAGE]),
    def(Orientation, false, &[Scolarite, Examens], &[]),
];

/// The definition of one module type.
pub fn definition(module_type: ModuleType) -> &'static ModuleDefinition {
    // DEFINITIONS is declared in ModuleType::ALL order.
    &DEFINITIONS[module_type as usize]
}

pub fn definitions() -> &'static [ModuleDefinition] {
    &DEFINITIONS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_definitions_follow_module_order() {
        for (module_type, definition) in ModuleType::ALL.iter().zip(definitions()) {
            assert_eq!(*module_type, definition.module_type);
        }
    }

    #[test]
    fn test_no_module_depends_on_itself() {
        for d in definitions() {
            assert!(!d.dependencies.contains(&d.module_type), "{}", d.module_type);
        }
    }

    #[test]
    fn test_default_enabled_set_is_self_consistent() {
        let enabled: HashSet<_> = definitions()
            .iter()
            .filter(|d| d.enabled_by_default)
            .map(|d| d.module_type)
            .collect();

        for d in definitions().iter().filter(|d| d.enabled_by_default) {
            for dep in d.dependencies {
                assert!(enabled.contains(dep), "{} needs {}", d.module_type, dep);
            }
        }
    }

    #[test]
    fn test_to_new_module_copies_declarations() {
        let new = definition(Finances).to_new_module(TenantId::new(), SchoolLevelId::new(), false);
        assert_eq!(new.dependencies, vec![Scolarite, Inscriptions]);
        assert_eq!(new.required_permissions, vec!["finances.read".to_string()]);
        assert!(!new.enabled);
    }
}
