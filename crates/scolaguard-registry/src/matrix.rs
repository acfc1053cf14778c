//! Static module-to-module access matrix.
//!
//! `(source, target) -> AccessLevel`: may a request issued from module
//! `source` read or write data owned by module `target`. The table is code,
//! not data: it is built once and shared read-only.

use std::collections::HashMap;
use std::sync::LazyLock;

use scolaguard_models::{AccessLevel, AccessMatrixEntry, ModuleType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessMatrix {
    entries: HashMap<(ModuleType, ModuleType), AccessLevel>,
}

#[derive(Debug, Default)]
pub struct AccessMatrixBuilder {
    entries: HashMap<(ModuleType, ModuleType), AccessLevel>,
}

impl AccessMatrixBuilder {
    pub fn grant(mut self, source: ModuleType, target: ModuleType, level: AccessLevel) -> Self {
        self.entries.insert((source, target), level);
        self
    }

    pub fn read(self, source: ModuleType, targets: &[ModuleType]) -> Self {
        targets
            .iter()
            .fold(self, |b, target| b.grant(source, *target, AccessLevel::Read))
    }

    pub fn read_write(self, source: ModuleType, targets: &[ModuleType]) -> Self {
        targets
            .iter()
            .fold(self, |b, target| b.grant(source, *target, AccessLevel::ReadWrite))
    }

    /// Every module gets ReadWrite on itself, overriding anything granted above.
    pub fn build(mut self) -> AccessMatrix {
        for module in ModuleType::ALL {
            self.entries
                .insert((module, module), AccessLevel::ReadWrite);
        }
        AccessMatrix {
            entries: self.entries,
        }
    }
}

impl AccessMatrix {
    pub fn builder() -> AccessMatrixBuilder {
        AccessMatrixBuilder::default()
    }

    /// The level declared for a pair, `None` when the pair has no entry.
    pub fn level(&self, source: ModuleType, target: ModuleType) -> Option<AccessLevel> {
        self.entries.get(&(source, target)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, sorted by source then target.
    pub fn entries(&self) -> Vec<AccessMatrixEntry> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|((source, target), level)| AccessMatrixEntry {
                source: *source,
                target: *target,
                level: *level,
            })
            .collect();
        entries.sort_by_key(|e| (e.source, e.target));
        entries
    }

    /// The platform matrix.
    pub fn standard() -> &'static AccessMatrix {
        &STANDARD
    }
}

static STANDARD: LazyLock<AccessMatrix> = LazyLock::new(|| {
    use ModuleType::*;

    AccessMatrix::builder()
        .read(
            Scolarite,
            &[
                Pedagogie,
                Examens,
                Presences,
                EmploiDuTemps,
                Finances,
                Discipline,
                Infirmerie,
                Orientation,
                Parametres,
            ],
        )
        .read_write(Scolarite, &[Inscriptions, Communication])
        .read(
            Finances,
            &[Scolarite, Inscriptions, Transport, Cantine, Parametres],
        )
        .read_write(Finances, &[Inventaire, Communication])
        .read(Examens, &[Scolarite, Pedagogie, Presences, Parametres])
        .read_write(Examens, &[Communication])
        .read(
            Communication,
            &[Scolarite, Examens, Presences, EmploiDuTemps, Parametres],
        )
        .read_write(Communication, &[Evenements])
        .read(Presences, &[Scolarite, EmploiDuTemps, Parametres])
        .read_write(Presences, &[Discipline, Communication])
        .read(
            EmploiDuTemps,
            &[Scolarite, Pedagogie, RessourcesHumaines, Parametres],
        )
        .read(Bibliotheque, &[Scolarite])
        .read_write(Bibliotheque, &[Communication])
        .read(Transport, &[Scolarite])
        .read_write(Transport, &[Finances, Communication])
        .read(Cantine, &[Scolarite])
        .read_write(Cantine, &[Finances, Inventaire])
        .read(RessourcesHumaines, &[EmploiDuTemps, Finances, Parametres])
        .read(Discipline, &[Scolarite, Presences])
        .read_write(Discipline, &[Communication])
        .read(Infirmerie, &[Scolarite])
        .read_write(Infirmerie, &[Communication])
        .read(Inscriptions, &[Parametres])
        .read_write(Inscriptions, &[Scolarite, Finances, Communication])
        .read(
            Pedagogie,
            &[Scolarite, EmploiDuTemps, Examens, RessourcesHumaines],
        )
        .read(
            PortailParents,
            &[
                Scolarite,
                Examens,
                Finances,
                Presences,
                EmploiDuTemps,
                Evenements,
            ],
        )
        .read_write(PortailParents, &[Communication])
        .read(Evenements, &[Scolarite])
        .read_write(Evenements, &[Communication])
        .read(Inventaire, &[Finances])
        .read(Rapports, &ModuleType::ALL)
        .read(Parametres, &ModuleType::ALL)
        .read(Orientation, &[Scolarite, Examens])
        .read_write(Orientation, &[Communication])
        .build()
});
