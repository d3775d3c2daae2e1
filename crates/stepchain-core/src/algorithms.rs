//! Rhythm generation helpers

/// Distribute `pulses` hits as evenly as possible over `steps` (Bjorklund)
///
/// The result is rotated left by `rotation` steps.
///
/// # Example
/// ```
/// use stepchain_core::euclidean_rhythm;
/// let hits = euclidean_rhythm(8, 3, 0);
/// assert_eq!(hits, vec![true, false, false, true, false, false, true, false]);
/// ```
pub fn euclidean_rhythm(steps: usize, pulses: usize, rotation: usize) -> Vec<bool> {
    if steps == 0 {
        return Vec::new();
    }

    let pulses = pulses.min(steps);
    if pulses == 0 || pulses == steps {
        return vec![pulses == steps; steps];
    }

    let mut groups: Vec<Vec<bool>> = vec![vec![true]; pulses];
    let mut rests: Vec<Vec<bool>> = vec![vec![false]; steps - pulses];

    loop {
        let pairs = groups.len().min(rests.len());
        let leftover = if groups.len() > pairs {
            groups.split_off(pairs)
        } else {
            rests.split_off(pairs)
        };

        for (group, rest) in groups.iter_mut().zip(rests.drain(..)) {
            group.extend(rest);
        }
        rests = leftover;

        if rests.len() <= 1 {
            break;
        }
    }

    let mut rhythm: Vec<bool> = groups.into_iter().chain(rests).flatten().collect();
    rhythm.rotate_left(rotation % steps);
    rhythm
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euclidean_rhythm() {
        assert_eq!(euclidean_rhythm(8, 3, 0), vec![true, false, false, true, false, false, true, false]);
        assert_eq!(euclidean_rhythm(8, 5, 0), vec![true, false, true, true, false, true, true, false]);
        assert_eq!(
            euclidean_rhythm(16, 4, 0),
            vec![
                true, false, false, false, true, false, false, false,
                true, false, false, false, true, false, false, false,
            ]
        );
    }

    #[test]
    fn test_euclidean_edges() {
        assert!(euclidean_rhythm(0, 3, 0).is_empty());
        assert_eq!(euclidean_rhythm(4, 0, 0), vec![false; 4]);
        assert_eq!(euclidean_rhythm(4, 9, 0), vec![true; 4]);
    }

    #[test]
    fn test_euclidean_rotation() {
        assert_eq!(euclidean_rhythm(8, 3, 1), vec![false, false, true, false, false, true, false, true]);
        // Full turn is identity
        assert_eq!(euclidean_rhythm(8, 3, 8), euclidean_rhythm(8, 3, 0));
    }

    #[test]
    fn test_euclidean_hit_count() {
        for steps in 1..=48 {
            for pulses in 0..=steps {
                let rhythm = euclidean_rhythm(steps, pulses, 0);
                assert_eq!(rhythm.len(), steps);
                assert_eq!(rhythm.iter().filter(|&&hit| hit).count(), pulses);
            }
        }
    }
}
