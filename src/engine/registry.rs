use std::collections::HashMap;

use rand::Rng;

use crate::core::domain::{Atom, AtomId, Coord, Site, SiteKind};
use crate::core::error::{KmcError, KmcResult};
use crate::core::eviction::RandomEvictionSet;
use crate::core::lattice::Lattice;
use crate::core::spatial;

/// Monotonic identity source. Starts at 1 and never hands out an id twice.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: AtomId,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    pub fn next_id(&mut self) -> AtomId {
        let id = self.next;
        self.next += 1;
        id
    }

    /// The id the next call to `next_id` will return.
    pub fn peek(&self) -> AtomId {
        self.next
    }
}

/// Atoms currently adsorbed on the surface.
///
/// Every atom is in `atoms` and in exactly one of the two kind-partitioned
/// sets, the one matching the kind of site it sits on. All mutations also
/// update the lattice occupancy so both structures move together.
#[derive(Debug)]
pub struct SurfaceAtomRegistry {
    atoms: HashMap<AtomId, Atom>,
    on_f: RandomEvictionSet<AtomId, Atom>,
    on_s: RandomEvictionSet<AtomId, Atom>,
    ids: IdAllocator,
    width: usize,
    height: usize,
}

impl SurfaceAtomRegistry {
    pub fn new(lattice: &Lattice) -> Self {
        Self {
            atoms: HashMap::new(),
            on_f: RandomEvictionSet::new(),
            on_s: RandomEvictionSet::new(),
            ids: IdAllocator::default(),
            width: lattice.width(),
            height: lattice.height(),
        }
    }

    fn partition(&self, kind: SiteKind) -> &RandomEvictionSet<AtomId, Atom> {
        match kind {
            SiteKind::F => &self.on_f,
            SiteKind::S => &self.on_s,
        }
    }

    /// Adsorbs a new atom onto `site`, which the caller has drawn from a free pool.
    pub fn place(&mut self, lattice: &mut Lattice, site: &Site) -> KmcResult<Atom> {
        let id = self.ids.peek();
        lattice.occupy(site.coord, id)?;
        self.ids.next_id();

        let atom = Atom {
            id,
            coord: site.coord,
            kind: site.kind,
        };
        self.atoms.insert(id, atom);
        self.partition(atom.kind).insert(id, atom);
        Ok(atom)
    }

    /// Takes the atom off the surface and frees its site.
    pub fn remove(&mut self, lattice: &mut Lattice, id: AtomId) -> KmcResult<Atom> {
        let atom = self.atoms.remove(&id).ok_or(KmcError::UnknownAtom(id))?;
        self.partition(atom.kind).remove(&id);
        lattice.vacate(atom.coord)?;
        Ok(atom)
    }

    /// Hops `id` onto the free site `target`, moving it between partitions if
    /// the site kind changes.
    pub fn move_atom(&mut self, lattice: &mut Lattice, id: AtomId, target: &Site) -> KmcResult<Atom> {
        let mut atom = *self.atoms.get(&id).ok_or(KmcError::UnknownAtom(id))?;
        // Re-read the target so a stale `Site` copy cannot half-apply the hop.
        let target = lattice.site(target.coord)?;
        if !target.is_free {
            return Err(KmcError::SiteOccupied { x: target.coord.x, y: target.coord.y });
        }

        lattice.vacate(atom.coord)?;
        lattice.occupy(target.coord, id)?;

        self.partition(atom.kind).remove(&id);
        atom.relocate(target.coord, target.kind);
        self.atoms.insert(id, atom);
        self.partition(atom.kind).insert(id, atom);
        Ok(atom)
    }

    /// Uniformly random in-bounds axis-aligned neighbour of the atom's site.
    pub fn pick_neighbour_coordinate<R: Rng + ?Sized>(&self, id: AtomId, rng: &mut R) -> KmcResult<Coord> {
        let atom = self.atoms.get(&id).ok_or(KmcError::UnknownAtom(id))?;
        spatial::random_neighbour(atom.coord, self.width, self.height, rng)
            .ok_or(KmcError::NoNeighbour { x: atom.coord.x, y: atom.coord.y })
    }

    pub fn random_atom<R: Rng + ?Sized>(&self, kind: SiteKind, rng: &mut R) -> Option<Atom> {
        self.partition(kind).random_uniform(rng).map(|(_, atom)| atom)
    }

    pub fn get(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(&id)
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn count_on(&self, kind: SiteKind) -> usize {
        self.partition(kind).len()
    }

    /// Verifies the membership/partition invariant against the lattice.
    pub fn is_consistent(&self, lattice: &Lattice) -> bool {
        let partitions_match = self.atoms.values().all(|atom| {
            let (own, other) = match atom.kind {
                SiteKind::F => (&self.on_f, &self.on_s),
                SiteKind::S => (&self.on_s, &self.on_f),
            };
            own.get(&atom.id) == Some(*atom) && !other.contains(&atom.id)
        });
        let sites_match = self.atoms.values().all(|atom| {
            lattice
                .site(atom.coord)
                .map(|s| !s.is_free && s.atom == Some(atom.id) && s.kind == atom.kind)
                .unwrap_or(false)
        });

        partitions_match
            && sites_match
            && self.on_f.len() + self.on_s.len() == self.atoms.len()
            && self.on_f.is_consistent()
            && self.on_s.is_consistent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn ids_are_never_reused() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut lattice = Lattice::new(3, 3, 0.0, &mut rng).unwrap();
        let mut registry = SurfaceAtomRegistry::new(&lattice);

        let site = lattice.random_free_site(SiteKind::F, &mut rng).unwrap();
        let first = registry.place(&mut lattice, &site).unwrap();
        registry.remove(&mut lattice, first.id).unwrap();

        let site = lattice.random_free_site(SiteKind::F, &mut rng).unwrap();
        let second = registry.place(&mut lattice, &site).unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[test]
    fn failed_place_does_not_consume_id() {
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let mut lattice = Lattice::new(2, 2, 0.0, &mut rng).unwrap();
        let mut registry = SurfaceAtomRegistry::new(&lattice);

        let site = lattice.site(Coord::new(0, 0)).unwrap();
        registry.place(&mut lattice, &site).unwrap();
        assert!(registry.place(&mut lattice, &site).is_err());
        assert_eq!(registry.len(), 1);
        assert!(registry.is_consistent(&lattice));

        let other = lattice.site(Coord::new(1, 0)).unwrap();
        assert_eq!(registry.place(&mut lattice, &other).unwrap().id, 2);
    }

    #[test]
    fn remove_unknown_atom_fails() {
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        let mut lattice = Lattice::new(2, 2, 0.0, &mut rng).unwrap();
        let mut registry = SurfaceAtomRegistry::new(&lattice);
        assert!(matches!(registry.remove(&mut lattice, 42), Err(KmcError::UnknownAtom(42))));
    }
}
