/// Work space of the Viterbi decoder for one sentence.
#[derive(Debug, Default)]
pub struct Lattice {
    /**
     * The total number of distinct labels (L).
     */
    pub num_labels: usize,

    /**
     * The number of items (T) in the framed sentence, boundaries included.
     */
    num_items: usize,

    /**
     * The number of items the buffers can hold without growing.
     */
    cap_items: usize,

    /**
     * State scores.
     *  This is a [T][L] matrix whose element [t][l] presents the emission
     *  probability of the observation at #t under label #l.
     */
    pub state: Vec<f64>,

    /**
     * Transition scores.
     *  This is a [L][L] matrix whose element [i][j] represents the
     *  probability of label #j following label #i.
     */
    pub trans: Vec<f64>,

    /**
     * Path probability matrix.
     *  This is a [T][L] matrix whose element [t][l] presents the maximum
     *  probability of any label path arriving at (t, l).
     */
    score: Vec<f64>,

    /// First position whose every path probability is zero.
    first_zero: Option<usize>,
}

impl Lattice {
    pub fn new(num_labels: usize, trans: &[f64]) -> Self {
        debug_assert_eq!(trans.len(), num_labels * num_labels, "transition matrix must be [L][L]");
        Self {
            num_labels,
            trans: trans.to_vec(),
            ..Default::default()
        }
    }

    pub fn num_items(&self) -> usize {
        self.num_items
    }

    pub fn set_num_items(&mut self, t: usize) {
        let l = self.num_labels;
        self.num_items = t;
        if self.cap_items < t {
            self.state.resize(t * l, 0.0);
            self.score.resize(t * l, 0.0);
            self.cap_items = t;
        }
    }

    pub fn reset(&mut self) {
        let n = self.num_items * self.num_labels;
        self.state[..n].fill(0.0);
        self.score[..n].fill(0.0);
        self.first_zero = None;
    }

    #[inline]
    pub fn state_row_mut(&mut self, t: usize) -> &mut [f64] {
        let l = self.num_labels;
        &mut self.state[l * t..l * (t + 1)]
    }

    #[inline]
    pub fn score(&self, t: usize, j: usize) -> f64 {
        self.score[self.num_labels * t + j]
    }

    pub fn first_zero_column(&self) -> Option<usize> {
        self.first_zero
    }

    /// Fills the path probability matrix.
    ///
    /// Item #0 is the leading boundary observation and is certain for every
    /// label; item #1 is reached from label #`start`; later items take the
    /// best predecessor, the first maximum in label order on ties. Scores are
    /// plain probabilities, not logarithms.
    pub fn viterbi(&mut self, start: usize) {
        let t_max = self.num_items;
        let l = self.num_labels;

        /* Compute the scores at (0, *). */
        for j in 0..l {
            self.score[j] = 1.0;
        }
        if t_max < 2 {
            return;
        }

        /* Compute the scores at (1, *). */
        for j in 0..l {
            self.score[l + j] = self.trans[l * start + j] * self.score[j] * self.state[l + j];
        }
        self.check_column(1);

        /* Compute the scores at (t, *). */
        for t in 2..t_max {
            for j in 0..l {
                let mut max_score = f64::NEG_INFINITY;
                for i in 0..l {
                    /* Transit from (t-1, i) to (t, j). */
                    let score = self.score[l * (t - 1) + i] * self.trans[l * i + j];
                    if max_score < score {
                        max_score = score;
                    }
                }
                self.score[l * t + j] = max_score * self.state[l * t + j];
            }
            self.check_column(t);
        }
    }

    fn check_column(&mut self, t: usize) {
        if self.first_zero.is_some() {
            return;
        }
        let l = self.num_labels;
        if self.score[l * t..l * (t + 1)].iter().all(|&s| s == 0.0) {
            log::warn!("every path probability is zero at item #{t}");
            self.first_zero = Some(t);
        }
    }

    /// Label with the highest path probability at item #`t`, the first one on
    /// ties.
    pub fn argmax(&self, t: usize) -> usize {
        let l = self.num_labels;
        let row = &self.score[l * t..l * (t + 1)];
        let mut best = 0;
        for (j, &s) in row.iter().enumerate().skip(1) {
            if row[best] < s {
                best = j;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lattice(trans: &[f64], state: &[f64]) -> Lattice {
        let l = (trans.len() as f64).sqrt() as usize;
        let mut lat = Lattice::new(l, trans);
        lat.set_num_items(state.len() / l);
        lat.reset();
        lat.state[..state.len()].copy_from_slice(state);
        lat
    }

    #[test]
    fn boundary_column_is_certain() {
        let mut lat = lattice(&[0.5, 0.5, 0.5, 0.5], &[0.0, 0.0, 1.0, 1.0]);
        lat.viterbi(0);
        assert_eq!(lat.score(0, 0), 1.0);
        assert_eq!(lat.score(0, 1), 1.0);
        assert_eq!(lat.score(1, 1), 0.5);
    }

    #[test]
    fn recurrence_takes_best_predecessor() {
        // labels: 0 = ".", 1 = A, 2 = B
        let trans = [
            0.0, 0.6, 0.4, //
            1.0, 0.0, 0.0, //
            0.5, 0.0, 0.5, //
        ];
        let state = [
            1.0, 0.0, 0.0, //
            0.0, 0.5, 1.0, //
            1.0, 0.0, 0.0, //
        ];
        let mut lat = lattice(&trans, &state);
        lat.viterbi(0);
        assert_eq!(lat.score(1, 1), 0.3);
        assert_eq!(lat.score(1, 2), 0.4);
        // max(0.3 * 1.0, 0.4 * 0.5) = 0.3
        assert_eq!(lat.score(2, 0), 0.3);
        assert_eq!(lat.argmax(1), 2);
        assert_eq!(lat.argmax(2), 0);
        assert_eq!(lat.first_zero_column(), None);
    }

    #[test]
    fn first_maximum_wins() {
        let mut lat = lattice(&[0.0, 0.5, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0], &[0.0, 0.0, 0.0, 0.0, 1.0, 1.0]);
        lat.viterbi(0);
        assert_eq!(lat.score(1, 1), lat.score(1, 2));
        assert_eq!(lat.argmax(1), 1);
        assert_eq!(lat.argmax(0), 0);
    }

    #[test]
    fn zero_column_detected() {
        let mut lat = lattice(&[1.0, 0.0, 0.0, 1.0], &[1.0, 0.0, 0.0, 1.0, 1.0, 0.0]);
        lat.viterbi(0);
        assert_eq!(lat.first_zero_column(), Some(1));
        assert_eq!(lat.score(2, 0), 0.0);
        assert_eq!(lat.argmax(2), 0);
    }

    #[test]
    fn buffers_are_reused() {
        let mut lat = Lattice::new(2, &[1.0; 4]);
        lat.set_num_items(5);
        lat.set_num_items(3);
        assert_eq!(lat.num_items(), 3);
        assert_eq!(lat.state.len(), 10);
        lat.reset();
    }
}
