use rand::Rng;

use crate::core::domain::{AtomId, Coord, Site, SiteId, SiteKind};
use crate::core::error::{KmcError, KmcResult};
use crate::core::eviction::RandomEvictionSet;

/// Pool of free sites of one kind, keyed by site id.
pub type FreePool = RandomEvictionSet<SiteId, Coord>;

/// Fixed rectangular grid of binding sites.
///
/// Sites are stored flattened, `index = y * width + x`. Each free site sits
/// in exactly one of the two free pools (the one matching its kind);
/// occupied sites are in neither.
#[derive(Debug)]
pub struct Lattice {
    width: usize,
    height: usize,
    num_s_sites: usize,
    sites: Vec<Site>,
    free_f: FreePool,
    free_s: FreePool,
}

impl Lattice {
    /// Builds a `width` x `height` lattice with `round(width * height * s_fraction)`
    /// S-sites placed by rejection sampling over uniformly random coordinates.
    pub fn new<R: Rng + ?Sized>(
        width: usize,
        height: usize,
        s_fraction: f64,
        rng: &mut R,
    ) -> KmcResult<Self> {
        if width == 0 || height == 0 {
            return Err(KmcError::config("lattice dimensions must be positive"));
        }
        if !(0.0..=1.0).contains(&s_fraction) {
            return Err(KmcError::config(format!("S-site fraction {s_fraction} outside [0, 1]")));
        }

        let total = width * height;
        let num_s_sites = ((total as f64 * s_fraction).round() as usize).min(total);

        let mut sites: Vec<Site> = (0..total)
            .map(|id| Site {
                id,
                coord: Coord::new(id % width, id / width),
                kind: SiteKind::F,
                is_free: true,
                atom: None,
            })
            .collect();

        let mut placed = 0;
        while placed < num_s_sites {
            let x = rng.gen_range(0..width);
            let y = rng.gen_range(0..height);
            let site = &mut sites[y * width + x];
            if site.kind != SiteKind::S {
                site.kind = SiteKind::S;
                placed += 1;
            }
        }

        let free_f = FreePool::with_capacity(total - num_s_sites);
        let free_s = FreePool::with_capacity(num_s_sites);
        for site in &sites {
            match site.kind {
                SiteKind::F => free_f.insert(site.id, site.coord),
                SiteKind::S => free_s.insert(site.id, site.coord),
            };
        }

        Ok(Self {
            width,
            height,
            num_s_sites,
            sites,
            free_f,
            free_s,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn total_sites(&self) -> usize {
        self.sites.len()
    }

    pub fn sites_of(&self, kind: SiteKind) -> usize {
        match kind {
            SiteKind::F => self.sites.len() - self.num_s_sites,
            SiteKind::S => self.num_s_sites,
        }
    }

    pub fn contains(&self, coord: Coord) -> bool {
        coord.x < self.width && coord.y < self.height
    }

    fn index(&self, coord: Coord) -> KmcResult<usize> {
        if self.contains(coord) {
            Ok(coord.y * self.width + coord.x)
        } else {
            Err(KmcError::OutOfBounds { x: coord.x, y: coord.y })
        }
    }

    pub fn free_pool(&self, kind: SiteKind) -> &FreePool {
        match kind {
            SiteKind::F => &self.free_f,
            SiteKind::S => &self.free_s,
        }
    }

    /// Marks the site occupied by `atom` and takes it out of its free pool.
    pub fn occupy(&mut self, coord: Coord, atom: AtomId) -> KmcResult<()> {
        let idx = self.index(coord)?;
        let site = self.sites[idx];
        if !site.is_free {
            return Err(KmcError::SiteOccupied { x: coord.x, y: coord.y });
        }
        self.sites[idx].is_free = false;
        self.sites[idx].atom = Some(atom);
        self.free_pool(site.kind).remove(&site.id);
        Ok(())
    }

    /// Frees the site and returns it to its free pool.
    pub fn vacate(&mut self, coord: Coord) -> KmcResult<()> {
        let idx = self.index(coord)?;
        let site = self.sites[idx];
        if site.is_free {
            return Err(KmcError::SiteFree { x: coord.x, y: coord.y });
        }
        self.sites[idx].is_free = true;
        self.sites[idx].atom = None;
        self.free_pool(site.kind).insert(site.id, site.coord);
        Ok(())
    }

    pub fn site(&self, coord: Coord) -> KmcResult<Site> {
        Ok(self.sites[self.index(coord)?])
    }

    pub fn count_free(&self, kind: SiteKind) -> usize {
        self.free_pool(kind).len()
    }

    /// Draws a uniformly random free site of `kind` without occupying it.
    pub fn random_free_site<R: Rng + ?Sized>(&self, kind: SiteKind, rng: &mut R) -> Option<Site> {
        let (id, _) = self.free_pool(kind).random_uniform(rng)?;
        self.sites.get(id).copied()
    }

    pub fn sites(&self) -> impl Iterator<Item = &Site> {
        self.sites.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn free_count(lattice: &Lattice, kind: SiteKind) -> usize {
        lattice.sites().filter(|s| s.kind == kind && s.is_free).count()
    }

    #[test]
    fn occupy_then_vacate_round_trips_pools() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut lattice = Lattice::new(4, 3, 0.25, &mut rng).unwrap();
        let site = lattice.random_free_site(SiteKind::S, &mut rng).unwrap();

        lattice.occupy(site.coord, 1).unwrap();
        assert_eq!(lattice.count_free(SiteKind::S), 2);
        assert_eq!(lattice.site(site.coord).unwrap().atom, Some(1));
        assert!(matches!(lattice.occupy(site.coord, 2), Err(KmcError::SiteOccupied { .. })));

        lattice.vacate(site.coord).unwrap();
        assert_eq!(lattice.count_free(SiteKind::S), 3);
        assert!(lattice.site(site.coord).unwrap().is_free);
        assert!(matches!(lattice.vacate(site.coord), Err(KmcError::SiteFree { .. })));
    }

    #[test]
    fn out_of_bounds_lookup_fails() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let lattice = Lattice::new(3, 3, 0.0, &mut rng).unwrap();
        assert!(matches!(lattice.site(Coord::new(3, 0)), Err(KmcError::OutOfBounds { .. })));
    }

    #[test]
    fn full_s_fraction_terminates() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let lattice = Lattice::new(5, 5, 1.0, &mut rng).unwrap();
        assert_eq!(lattice.count_free(SiteKind::S), 25);
        assert_eq!(lattice.count_free(SiteKind::F), 0);
    }

    proptest! {
        #[test]
        fn classification_counts_hold(w in 1usize..30, h in 1usize..30, f in 0.0f64..=1.0, seed in any::<u64>()) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let lattice = Lattice::new(w, h, f, &mut rng).unwrap();
            let expected_s = ((w * h) as f64 * f).round() as usize;

            prop_assert_eq!(lattice.sites().filter(|s| s.kind == SiteKind::S).count(), expected_s);
            prop_assert_eq!(lattice.sites().filter(|s| s.kind == SiteKind::F).count(), w * h - expected_s);
            prop_assert_eq!(lattice.count_free(SiteKind::S), free_count(&lattice, SiteKind::S));
            prop_assert_eq!(lattice.count_free(SiteKind::F), free_count(&lattice, SiteKind::F));
        }
    }
}
