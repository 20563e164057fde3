//! The `cpx-matnbyn` library provides dense complex matrices and column vectors of
//! arbitrary (small) size for working through quantum-computing exercises:
//! conjugate transposes, Hermitian and unitary checks, Hermitian eigen-decomposition,
//! Kronecker (tensor) products and step-by-step circuit evaluation.
//! It leverages the `num-complex` crate for complex number arithmetic and `nalgebra`
//! for the Hermitian eigensolver.

use core::fmt;
use core::ops::{Index, Mul, Neg};
use nalgebra::{DMatrix, linalg::SymmetricEigen};
pub use num_complex::Complex64;
use thiserror::Error;
use tracing::{debug, trace};

/// Default per-entry tolerance used by the approximate comparisons.
pub const DEFAULT_EPSILON: f64 = 1e-9;

/// Represents the complex number 0.
pub const ZERO: Complex64 = Complex64::new(0.0, 0.0);
/// Represents the complex number 1.
pub const ONE: Complex64 = Complex64::new(1.0, 0.0);
/// Represents the imaginary unit i.
pub const I: Complex64 = Complex64::new(0.0, 1.0);
/// Represents -i.
pub const NEG_I: Complex64 = Complex64::new(0.0, -1.0);
/// Represents 1/√2.
pub const INV_SQRT_2: Complex64 = Complex64::new(core::f64::consts::FRAC_1_SQRT_2, 0.0);

/// Row and column count of a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// Errors raised by matrix construction and the linear-algebra operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// No rows, or rows without entries.
    #[error("a matrix needs at least one row and one column")]
    Empty,

    /// A row whose length differs from the first row.
    #[error("row {row} has {found} entries, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// Operand shapes that the operation cannot combine.
    #[error("{op}: incompatible shapes {left} and {right}")]
    ShapeMismatch {
        op: &'static str,
        left: Shape,
        right: Shape,
    },

    /// An operation that needs a square matrix got a rectangular one.
    #[error("{op}: expected a square matrix, got {shape}")]
    NotSquare { op: &'static str, shape: Shape },

    /// An operation that needs a column vector got a wider matrix.
    #[error("{op}: expected a column vector, got {shape}")]
    NotVector { op: &'static str, shape: Shape },

    /// Element access outside the matrix.
    #[error("index ({row}, {col}) out of range for {shape} matrix")]
    IndexOutOfRange { row: usize, col: usize, shape: Shape },

    /// Eigen-decomposition input that is not Hermitian within `epsilon`.
    #[error("matrix is not Hermitian within tolerance {epsilon}")]
    NotHermitian { epsilon: f64 },

    /// Normalization of a vector whose norm is zero.
    #[error("cannot normalize a zero vector")]
    ZeroNorm,
}

/// Coarse classification of [`Error`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Shape violations: construction, multiplication, addition or circuit application.
    Dimension,
    /// Out-of-range element access.
    Index,
    /// Eigen-decomposition requested for a non-Hermitian matrix.
    NotHermitian,
}

impl Error {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::IndexOutOfRange { .. } => ErrorKind::Index,
            Self::NotHermitian { .. } => ErrorKind::NotHermitian,
            Self::Empty
            | Self::RaggedRow { .. }
            | Self::ShapeMismatch { .. }
            | Self::NotSquare { .. }
            | Self::NotVector { .. }
            | Self::ZeroNorm => ErrorKind::Dimension,
        }
    }
}

/// Result type for matrix operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Dense, row-major complex matrix with at least one row and one column.
///
/// A column vector is a `ComplexMatrix` with a single column, so kets compose
/// with operators and with each other through the same [`tensor`] product.
/// Values are never mutated in place: every operation returns a new matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexMatrix {
    rows: usize,
    cols: usize,
    data: Vec<Complex64>,
}

/// An eigenvalue of a Hermitian matrix paired with its unit-norm eigenvector.
#[derive(Debug, Clone, PartialEq)]
pub struct EigenPair {
    /// Real eigenvalue.
    pub value: f64,
    /// Normalized eigenvector as a column vector.
    pub vector: ComplexMatrix,
}

/// Every state visited by [`evaluate_circuit`], starting with the initial state.
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitRun {
    states: Vec<ComplexMatrix>,
}

/// Ordered list of operators applied one after another to a state vector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Circuit {
    operators: Vec<ComplexMatrix>,
}

impl ComplexMatrix {
    /// Builds a matrix from an ordered sequence of rows.
    ///
    /// Fails with [`Error::Empty`] if there are no rows or the first row is empty,
    /// and with [`Error::RaggedRow`] if any row length differs from the first.
    pub fn from_rows<I, R>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = Complex64>,
    {
        let mut data = Vec::new();
        let mut cols = 0;
        let mut n_rows = 0;
        for (idx, row) in rows.into_iter().enumerate() {
            let before = data.len();
            data.extend(row);
            let found = data.len() - before;
            if idx == 0 {
                if found == 0 {
                    return Err(Error::Empty);
                }
                cols = found;
            } else if found != cols {
                return Err(Error::RaggedRow {
                    row: idx,
                    expected: cols,
                    found,
                });
            }
            n_rows += 1;
        }
        if n_rows == 0 {
            return Err(Error::Empty);
        }
        Ok(Self {
            rows: n_rows,
            cols,
            data,
        })
    }

    /// Builds a matrix from rows of `(re, im)` pairs.
    pub fn from_pairs<I, R>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = (f64, f64)>,
    {
        Self::from_rows(
            rows.into_iter()
                .map(|row| row.into_iter().map(|(re, im)| Complex64::new(re, im))),
        )
    }

    /// Builds a matrix from rows of real entries.
    pub fn from_real<I, R>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = f64>,
    {
        Self::from_rows(
            rows.into_iter()
                .map(|row| row.into_iter().map(|re| Complex64::new(re, 0.0))),
        )
    }

    /// Builds a column vector from its entries.
    pub fn column<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = Complex64>,
    {
        let data: Vec<Complex64> = entries.into_iter().collect();
        if data.is_empty() {
            return Err(Error::Empty);
        }
        Ok(Self {
            rows: data.len(),
            cols: 1,
            data,
        })
    }

    /// Returns the all-zero matrix of the given shape.
    pub fn zeros(rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::Empty);
        }
        Ok(Self::from_fn(rows, cols, |_, _| ZERO))
    }

    /// Returns the `n`×`n` identity matrix.
    pub fn identity(n: usize) -> Result<Self> {
        if n == 0 {
            return Err(Error::Empty);
        }
        Ok(Self::from_fn(n, n, |i, j| if i == j { ONE } else { ZERO }))
    }

    /// Returns the computational basis vector |index⟩ of a `dim`-dimensional space.
    pub fn basis_state(dim: usize, index: usize) -> Result<Self> {
        if dim == 0 {
            return Err(Error::Empty);
        }
        if index >= dim {
            return Err(Error::IndexOutOfRange {
                row: index,
                col: 0,
                shape: Shape { rows: dim, cols: 1 },
            });
        }
        Ok(Self::from_fn(dim, 1, |i, _| if i == index { ONE } else { ZERO }))
    }

    // Callers guarantee rows >= 1 and cols >= 1.
    fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> Complex64) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j));
            }
        }
        Self { rows, cols, data }
    }

    fn from_array<const R: usize, const C: usize>(rows: [[Complex64; C]; R]) -> Self {
        debug_assert!(R > 0 && C > 0);
        Self {
            rows: R,
            cols: C,
            data: rows.into_iter().flatten().collect(),
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row and column count as a [`Shape`].
    pub fn shape(&self) -> Shape {
        Shape {
            rows: self.rows,
            cols: self.cols,
        }
    }

    /// Returns `true` if the row and column counts agree.
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Returns `true` for a column vector.
    pub fn is_vector(&self) -> bool {
        self.cols == 1
    }

    /// Returns the entry at (`row`, `col`), or [`Error::IndexOutOfRange`].
    pub fn get(&self, row: usize, col: usize) -> Result<Complex64> {
        if row >= self.rows || col >= self.cols {
            return Err(Error::IndexOutOfRange {
                row,
                col,
                shape: self.shape(),
            });
        }
        Ok(self.at(row, col))
    }

    /// Returns one row as a slice.
    pub fn row(&self, row: usize) -> Result<&[Complex64]> {
        if row >= self.rows {
            return Err(Error::IndexOutOfRange {
                row,
                col: 0,
                shape: self.shape(),
            });
        }
        Ok(&self.data[row * self.cols..(row + 1) * self.cols])
    }

    /// All entries in row-major order.
    pub fn entries(&self) -> &[Complex64] {
        &self.data
    }

    fn at(&self, row: usize, col: usize) -> Complex64 {
        self.data[row * self.cols + col]
    }

    fn require_square(&self, op: &'static str) -> Result<()> {
        if self.is_square() {
            Ok(())
        } else {
            Err(Error::NotSquare {
                op,
                shape: self.shape(),
            })
        }
    }

    fn require_vector(&self, op: &'static str) -> Result<()> {
        if self.is_vector() {
            Ok(())
        } else {
            Err(Error::NotVector {
                op,
                shape: self.shape(),
            })
        }
    }

    fn map(&self, f: impl Fn(Complex64) -> Complex64) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&z| f(z)).collect(),
        }
    }

    fn zip_with(
        &self,
        rhs: &ComplexMatrix,
        op: &'static str,
        f: impl Fn(Complex64, Complex64) -> Complex64,
    ) -> Result<Self> {
        if self.shape() != rhs.shape() {
            return Err(Error::ShapeMismatch {
                op,
                left: self.shape(),
                right: rhs.shape(),
            });
        }
        Ok(Self {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .zip(&rhs.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        })
    }

    /// Matrix product `self · rhs`.
    pub fn matmul(&self, rhs: &ComplexMatrix) -> Result<Self> {
        if self.cols != rhs.rows {
            return Err(Error::ShapeMismatch {
                op: "matmul",
                left: self.shape(),
                right: rhs.shape(),
            });
        }
        Ok(Self::from_fn(self.rows, rhs.cols, |i, j| {
            (0..self.cols).map(|k| self.at(i, k) * rhs.at(k, j)).sum()
        }))
    }

    /// Entry-wise sum of two matrices of the same shape.
    pub fn checked_add(&self, rhs: &ComplexMatrix) -> Result<Self> {
        self.zip_with(rhs, "add", |a, b| a + b)
    }

    /// Entry-wise difference of two matrices of the same shape.
    pub fn checked_sub(&self, rhs: &ComplexMatrix) -> Result<Self> {
        self.zip_with(rhs, "sub", |a, b| a - b)
    }

    /// Multiplies every entry by `scalar`.
    pub fn scale(&self, scalar: Complex64) -> Self {
        self.map(|z| z * scalar)
    }

    /// Entry-wise complex conjugate.
    pub fn conj(&self) -> Self {
        self.map(|z| z.conj())
    }

    /// Transpose without conjugation.
    pub fn transpose(&self) -> Self {
        Self::from_fn(self.cols, self.rows, |i, j| self.at(j, i))
    }

    /// Conjugate transpose (dagger): an R×C input gives a C×R output.
    pub fn adjoint(&self) -> Self {
        Self::from_fn(self.cols, self.rows, |i, j| self.at(j, i).conj())
    }

    /// Sum of the diagonal entries of a square matrix.
    pub fn trace(&self) -> Result<Complex64> {
        self.require_square("trace")?;
        Ok((0..self.rows).map(|i| self.at(i, i)).sum())
    }

    /// Square root of the sum of squared entry moduli.
    pub fn frobenius_norm(&self) -> f64 {
        self.data.iter().map(|z| z.norm_sqr()).sum::<f64>().sqrt()
    }

    /// Hermitian inner product ⟨self|other⟩ of two column vectors (conjugate-linear in `self`).
    pub fn inner(&self, other: &ComplexMatrix) -> Result<Complex64> {
        self.require_vector("inner")?;
        other.require_vector("inner")?;
        if self.rows != other.rows {
            return Err(Error::ShapeMismatch {
                op: "inner",
                left: self.shape(),
                right: other.shape(),
            });
        }
        Ok(self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| a.conj() * b)
            .sum())
    }

    /// Euclidean norm of a column vector.
    pub fn norm(&self) -> Result<f64> {
        self.require_vector("norm")?;
        Ok(self.frobenius_norm())
    }

    /// Returns the column vector scaled to unit norm.
    pub fn normalized(&self) -> Result<Self> {
        let norm = self.norm()?;
        if norm == 0.0 {
            return Err(Error::ZeroNorm);
        }
        Ok(self.scale(Complex64::new(norm.recip(), 0.0)))
    }

    /// Squared amplitude moduli of a column vector, i.e. the measurement
    /// probabilities in the computational basis.
    pub fn probabilities(&self) -> Result<Vec<f64>> {
        self.require_vector("probabilities")?;
        Ok(self.data.iter().map(|z| z.norm_sqr()).collect())
    }

    /// Returns `true` if both shapes agree and every pair of entries differs by at most `epsilon`.
    pub fn approx_eq(&self, other: &ComplexMatrix, epsilon: f64) -> bool {
        self.shape() == other.shape()
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| (a - b).norm() <= epsilon)
    }
}

impl Index<(usize, usize)> for ComplexMatrix {
    type Output = Complex64;
    fn index(&self, (row, col): (usize, usize)) -> &Complex64 {
        assert!(
            row < self.rows && col < self.cols,
            "index ({row}, {col}) out of range for {} matrix",
            self.shape()
        );
        &self.data[row * self.cols + col]
    }
}

impl Neg for ComplexMatrix {
    type Output = ComplexMatrix;
    fn neg(self) -> ComplexMatrix {
        self.map(|z| -z)
    }
}
impl Neg for &ComplexMatrix {
    type Output = ComplexMatrix;
    fn neg(self) -> ComplexMatrix {
        self.map(|z| -z)
    }
}

impl Mul<ComplexMatrix> for Complex64 {
    type Output = ComplexMatrix;
    fn mul(self, matrix: ComplexMatrix) -> ComplexMatrix {
        matrix.scale(self)
    }
}
impl Mul<Complex64> for ComplexMatrix {
    type Output = ComplexMatrix;
    fn mul(self, scalar: Complex64) -> ComplexMatrix {
        scalar * self
    }
}
impl Mul<ComplexMatrix> for f64 {
    type Output = ComplexMatrix;
    fn mul(self, matrix: ComplexMatrix) -> ComplexMatrix {
        matrix.scale(Complex64::new(self, 0.0))
    }
}
impl Mul<f64> for ComplexMatrix {
    type Output = ComplexMatrix;
    fn mul(self, scalar: f64) -> ComplexMatrix {
        scalar * self
    }
}

/// Conjugate transpose of `matrix`.
pub fn adjoint(matrix: &ComplexMatrix) -> ComplexMatrix {
    matrix.adjoint()
}

/// Checks `|m[i][j] - conj(m[j][i])| <= epsilon` for every entry of a square matrix.
pub fn is_hermitian(matrix: &ComplexMatrix, epsilon: f64) -> Result<bool> {
    matrix.require_square("is_hermitian")?;
    let n = matrix.rows;
    Ok((0..n).all(|i| {
        (0..n).all(|j| (matrix.at(i, j) - matrix.at(j, i).conj()).norm() <= epsilon)
    }))
}

/// Checks that `m · m†` is within `epsilon` of the identity, entry by entry.
pub fn is_unitary(matrix: &ComplexMatrix, epsilon: f64) -> Result<bool> {
    matrix.require_square("is_unitary")?;
    let product = matrix.matmul(&matrix.adjoint())?;
    Ok(product.approx_eq(&ComplexMatrix::identity(matrix.rows)?, epsilon))
}

/// Eigen-decomposition of a Hermitian matrix, checked against [`DEFAULT_EPSILON`].
pub fn hermitian_eigen(matrix: &ComplexMatrix) -> Result<Vec<EigenPair>> {
    hermitian_eigen_with_epsilon(matrix, DEFAULT_EPSILON)
}

/// Eigen-decomposition of a Hermitian matrix.
///
/// Returns one [`EigenPair`] per row, sorted by ascending eigenvalue. Eigenvalues
/// are real and eigenvectors are orthonormal. Fails with [`Error::NotSquare`] or
/// [`Error::NotHermitian`] if the input is not Hermitian within `epsilon`.
pub fn hermitian_eigen_with_epsilon(
    matrix: &ComplexMatrix,
    epsilon: f64,
) -> Result<Vec<EigenPair>> {
    if !is_hermitian(matrix, epsilon)? {
        debug!(shape = %matrix.shape(), epsilon, "rejected non-Hermitian eigen input");
        return Err(Error::NotHermitian { epsilon });
    }
    let n = matrix.rows;
    // Only the lower triangle is read by the solver.
    let eigen = SymmetricEigen::new(DMatrix::from_row_slice(n, n, &matrix.data));

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));

    let pairs: Vec<EigenPair> = order
        .into_iter()
        .map(|k| EigenPair {
            value: eigen.eigenvalues[k],
            vector: ComplexMatrix {
                rows: n,
                cols: 1,
                data: eigen.eigenvectors.column(k).iter().copied().collect(),
            },
        })
        .collect();
    trace!(
        spectrum = ?pairs.iter().map(|p| p.value).collect::<Vec<_>>(),
        "hermitian eigen-decomposition"
    );
    Ok(pairs)
}

/// Rebuilds `Σ λ |v⟩⟨v|` from an eigen-decomposition.
pub fn spectral_reconstruct(pairs: &[EigenPair]) -> Result<ComplexMatrix> {
    let term = |pair: &EigenPair| -> Result<ComplexMatrix> {
        Ok(pair.value * outer(&pair.vector, &pair.vector)?)
    };
    let (first, rest) = pairs.split_first().ok_or(Error::Empty)?;
    rest.iter()
        .try_fold(term(first)?, |acc, pair| acc.checked_add(&term(pair)?))
}

/// Kronecker (tensor) product `a ⊗ b`.
///
/// For shapes (R1, C1) and (R2, C2) the result is (R1·R2, C1·C2), with
/// `out[i1·R2 + i2][j1·C2 + j2] = a[i1][j1] · b[i2][j2]`.
pub fn tensor(a: &ComplexMatrix, b: &ComplexMatrix) -> ComplexMatrix {
    ComplexMatrix::from_fn(a.rows * b.rows, a.cols * b.cols, |row, col| {
        a.at(row / b.rows, col / b.cols) * b.at(row % b.rows, col % b.cols)
    })
}

/// Left fold of [`tensor`] over `matrices`: `m0 ⊗ m1 ⊗ … ⊗ mk`.
pub fn tensor_all(matrices: &[ComplexMatrix]) -> Result<ComplexMatrix> {
    let (first, rest) = matrices.split_first().ok_or(Error::Empty)?;
    Ok(rest.iter().fold(first.clone(), |acc, m| tensor(&acc, m)))
}

/// `matrix` tensored with itself `n` times, e.g. `H⊗H` for `n = 2`.
pub fn tensor_power(matrix: &ComplexMatrix, n: usize) -> Result<ComplexMatrix> {
    if n == 0 {
        return Err(Error::Empty);
    }
    Ok((1..n).fold(matrix.clone(), |acc, _| tensor(&acc, matrix)))
}

/// Outer product |ket⟩⟨bra| of two column vectors.
pub fn outer(ket: &ComplexMatrix, bra: &ComplexMatrix) -> Result<ComplexMatrix> {
    ket.require_vector("outer")?;
    bra.require_vector("outer")?;
    Ok(tensor(ket, &bra.adjoint()))
}

/// Applies `operators` in order to `initial`, computing `ψk = Op_k · ψ(k-1)`.
///
/// The returned run holds `ψ0, ψ1, …, ψn`. The initial state must be a column
/// vector and every operator must be square with as many columns as the running
/// state has rows; otherwise the whole evaluation fails.
pub fn evaluate_circuit(
    initial: &ComplexMatrix,
    operators: &[ComplexMatrix],
) -> Result<CircuitRun> {
    initial.require_vector("evaluate_circuit")?;
    let mut states = Vec::with_capacity(operators.len() + 1);
    states.push(initial.clone());
    for (step, op) in operators.iter().enumerate() {
        op.require_square("evaluate_circuit")?;
        let current = &states[step];
        if op.cols != current.rows {
            return Err(Error::ShapeMismatch {
                op: "evaluate_circuit",
                left: op.shape(),
                right: current.shape(),
            });
        }
        let next = op.matmul(current)?;
        debug!(step = step + 1, dim = next.rows, "applied circuit operator");
        states.push(next);
    }
    Ok(CircuitRun { states })
}

impl CircuitRun {
    /// All states, `states()[0]` being the initial one.
    pub fn states(&self) -> &[ComplexMatrix] {
        &self.states
    }

    /// State after the last operator (the initial state for an empty circuit).
    pub fn final_state(&self) -> &ComplexMatrix {
        // Always holds at least the initial state.
        &self.states[self.states.len() - 1]
    }

    /// Number of operators applied.
    pub fn steps(&self) -> usize {
        self.states.len() - 1
    }

    /// Consumes the run, returning all states.
    pub fn into_states(self) -> Vec<ComplexMatrix> {
        self.states
    }
}

impl Circuit {
    /// Creates a circuit without operators.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an operator in place, applied after the ones already present.
    pub fn push(&mut self, operator: ComplexMatrix) {
        self.operators.push(operator);
    }

    /// Appends an operator, applied after the ones already present.
    pub fn with_operator(mut self, operator: ComplexMatrix) -> Self {
        self.operators.push(operator);
        self
    }

    /// Operators in application order.
    pub fn operators(&self) -> &[ComplexMatrix] {
        &self.operators
    }

    /// Number of operators.
    pub fn len(&self) -> usize {
        self.operators.len()
    }

    /// Returns `true` if the circuit has no operators.
    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    /// Evaluates the circuit on `initial`; see [`evaluate_circuit`].
    pub fn run(&self, initial: &ComplexMatrix) -> Result<CircuitRun> {
        evaluate_circuit(initial, &self.operators)
    }

    /// Composes the whole circuit into one operator `Op_n · … · Op_1`.
    pub fn unitary(&self) -> Result<ComplexMatrix> {
        let (first, rest) = self.operators.split_first().ok_or(Error::Empty)?;
        first.require_square("unitary")?;
        rest.iter().try_fold(first.clone(), |acc, op| {
            op.require_square("unitary")?;
            op.matmul(&acc)
        })
    }
}

impl FromIterator<ComplexMatrix> for Circuit {
    fn from_iter<T: IntoIterator<Item = ComplexMatrix>>(iter: T) -> Self {
        Self {
            operators: iter.into_iter().collect(),
        }
    }
}

/// Standard single- and two-qubit operators and basis states.
pub mod gates {
    use super::{ComplexMatrix, Complex64, INV_SQRT_2, I, NEG_I, ONE, ZERO};

    /// Represents the ket state \ket{0}.
    pub fn ket_zero() -> ComplexMatrix {
        ComplexMatrix::from_array([[ONE], [ZERO]])
    }
    /// Represents the ket state \ket{1}.
    pub fn ket_one() -> ComplexMatrix {
        ComplexMatrix::from_array([[ZERO], [ONE]])
    }
    /// Represents the ket state \ket{+}.
    pub fn ket_plus() -> ComplexMatrix {
        ComplexMatrix::from_array([[INV_SQRT_2], [INV_SQRT_2]])
    }
    /// Represents the ket state \ket{-}.
    pub fn ket_minus() -> ComplexMatrix {
        ComplexMatrix::from_array([[INV_SQRT_2], [-INV_SQRT_2]])
    }

    /// 2×2 identity.
    pub fn identity2() -> ComplexMatrix {
        ComplexMatrix::from_array([[ONE, ZERO], [ZERO, ONE]])
    }
    /// Pauli-X (NOT, or a mirror in the interferometer).
    pub fn pauli_x() -> ComplexMatrix {
        ComplexMatrix::from_array([[ZERO, ONE], [ONE, ZERO]])
    }
    /// Pauli-Y.
    pub fn pauli_y() -> ComplexMatrix {
        ComplexMatrix::from_array([[ZERO, NEG_I], [I, ZERO]])
    }
    /// Pauli-Z (phase flip).
    pub fn pauli_z() -> ComplexMatrix {
        ComplexMatrix::from_array([[ONE, ZERO], [ZERO, -ONE]])
    }
    /// Hadamard gate, also a balanced beam splitter.
    pub fn hadamard() -> ComplexMatrix {
        ComplexMatrix::from_array([[INV_SQRT_2, INV_SQRT_2], [INV_SQRT_2, -INV_SQRT_2]])
    }
    /// Relative phase `e^{iφ}` on \ket{1}.
    pub fn phase_shift(phi: f64) -> ComplexMatrix {
        ComplexMatrix::from_array([[ONE, ZERO], [ZERO, Complex64::from_polar(1.0, phi)]])
    }
    /// Controlled-NOT with the first qubit as control.
    pub fn cnot() -> ComplexMatrix {
        ComplexMatrix::from_array([
            [ONE, ZERO, ZERO, ZERO],
            [ZERO, ONE, ZERO, ZERO],
            [ZERO, ZERO, ZERO, ONE],
            [ZERO, ZERO, ONE, ZERO],
        ])
    }
}



#[cfg(test)]
mod eigen_tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn residual(matrix: &ComplexMatrix, pair: &EigenPair) -> f64 {
        let mv = matrix.matmul(&pair.vector).unwrap();
        let lv = pair.value * pair.vector.clone();
        mv.checked_sub(&lv).unwrap().frobenius_norm()
    }

    #[test]
    fn test_hermitian_eigenvalues_example() {
        let h = ComplexMatrix::from_pairs([[(3.0, 0.0), (2.0, 1.0)], [(2.0, -1.0), (1.0, 0.0)]])
            .unwrap();
        let pairs = hermitian_eigen(&h).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_abs_diff_eq!(pairs[0].value, 2.0 - 6f64.sqrt(), epsilon = DEFAULT_EPSILON);
        assert_abs_diff_eq!(pairs[1].value, 2.0 + 6f64.sqrt(), epsilon = DEFAULT_EPSILON);
        assert_abs_diff_eq!(pairs[0].value, -0.44948974, epsilon = 1e-8);
        assert_abs_diff_eq!(pairs[1].value, 4.44948974, epsilon = 1e-8);

        for pair in &pairs {
            assert!(residual(&h, pair) <= DEFAULT_EPSILON);
            assert_abs_diff_eq!(pair.vector.norm().unwrap(), 1.0, epsilon = DEFAULT_EPSILON);
        }
        let overlap = pairs[0].vector.inner(&pairs[1].vector).unwrap();
        assert!(overlap.norm() <= DEFAULT_EPSILON);
    }

    #[test]
    fn test_eigenvalues_are_sorted() {
        let m = ComplexMatrix::from_real([[5.0, 0.0, 0.0], [0.0, -2.0, 0.0], [0.0, 0.0, 1.0]])
            .unwrap();
        let values: Vec<f64> = hermitian_eigen(&m)
            .unwrap()
            .iter()
            .map(|pair| pair.value)
            .collect();
        assert_eq!(values.len(), 3);
        assert_abs_diff_eq!(values[0], -2.0, epsilon = DEFAULT_EPSILON);
        assert_abs_diff_eq!(values[1], 1.0, epsilon = DEFAULT_EPSILON);
        assert_abs_diff_eq!(values[2], 5.0, epsilon = DEFAULT_EPSILON);
    }

    #[test]
    fn test_pauli_y_spectrum() {
        let y = gates::pauli_y();
        let pairs = hermitian_eigen(&y).unwrap();
        assert_abs_diff_eq!(pairs[0].value, -1.0, epsilon = DEFAULT_EPSILON);
        assert_abs_diff_eq!(pairs[1].value, 1.0, epsilon = DEFAULT_EPSILON);
        for pair in &pairs {
            assert!(residual(&y, pair) <= DEFAULT_EPSILON);
        }
    }

    #[test]
    fn test_single_entry_and_degenerate_spectrum() {
        let scalar = ComplexMatrix::from_real([[-3.5]]).unwrap();
        let pairs = hermitian_eigen(&scalar).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_abs_diff_eq!(pairs[0].value, -3.5, epsilon = DEFAULT_EPSILON);
        assert_abs_diff_eq!(pairs[0].vector.norm().unwrap(), 1.0, epsilon = DEFAULT_EPSILON);

        let identity = ComplexMatrix::identity(3).unwrap();
        for pair in hermitian_eigen(&identity).unwrap() {
            assert_abs_diff_eq!(pair.value, 1.0, epsilon = DEFAULT_EPSILON);
            assert!(residual(&identity, &pair) <= DEFAULT_EPSILON);
        }
    }

    #[test]
    fn test_spectral_reconstruction() {
        let h = ComplexMatrix::from_pairs([
            [(2.0, 0.0), (0.0, -1.0), (1.0, 1.0)],
            [(0.0, 1.0), (3.0, 0.0), (0.5, 0.0)],
            [(1.0, -1.0), (0.5, 0.0), (-1.0, 0.0)],
        ])
        .unwrap();
        let pairs = hermitian_eigen(&h).unwrap();
        let rebuilt = spectral_reconstruct(&pairs).unwrap();
        assert!(rebuilt.approx_eq(&h, DEFAULT_EPSILON));
        assert_eq!(spectral_reconstruct(&[]), Err(Error::Empty));
    }

    #[test]
    fn test_nearly_hermitian_residual() {
        // Off by 5e-10 in the upper triangle, still Hermitian within tolerance.
        let h = ComplexMatrix::from_pairs([
            [(3.0, 0.0), (2.0 + 5e-10, 1.0)],
            [(2.0, -1.0), (1.0, 0.0)],
        ])
        .unwrap();
        assert!(is_hermitian(&h, DEFAULT_EPSILON).unwrap());
        assert!(h != adjoint(&h));

        let pairs = hermitian_eigen(&h).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_abs_diff_eq!(pairs[0].value, 2.0 - 6f64.sqrt(), epsilon = 1e-8);
        assert_abs_diff_eq!(pairs[1].value, 2.0 + 6f64.sqrt(), epsilon = 1e-8);
        for pair in &pairs {
            assert!(residual(&h, pair) <= DEFAULT_EPSILON);
            assert_abs_diff_eq!(pair.vector.norm().unwrap(), 1.0, epsilon = DEFAULT_EPSILON);
        }
    }

    #[test]
    fn test_non_hermitian_is_rejected() {
        let m = ComplexMatrix::from_real([[1.0, 2.0], [0.0, 1.0]]).unwrap();
        let err = hermitian_eigen(&m).unwrap_err();
        assert_eq!(err, Error::NotHermitian { epsilon: DEFAULT_EPSILON });
        assert_eq!(err.kind(), ErrorKind::NotHermitian);

        let loose = ComplexMatrix::from_real([[1.0, 2.0], [2.0 + 1e-6, 1.0]]).unwrap();
        assert!(hermitian_eigen(&loose).is_err());
        assert!(hermitian_eigen_with_epsilon(&loose, 1e-5).is_ok());

        let rect = ComplexMatrix::zeros(1, 2).unwrap();
        assert_eq!(hermitian_eigen(&rect).unwrap_err().kind(), ErrorKind::Dimension);
    }
}



#[test]
fn test_ket_constants() {
    use gates::*;
    assert_eq!(ket_zero(), ComplexMatrix::basis_state(2, 0).unwrap());
    assert_eq!(ket_one(), ComplexMatrix::basis_state(2, 1).unwrap());
    assert_eq!(hadamard().matmul(&ket_zero()).unwrap(), ket_plus());
    assert_eq!(hadamard().matmul(&ket_one()).unwrap(), ket_minus());
}

#[test]
fn test_pauli_products() {
    use gates::*;
    // XY = iZ
    let xy = pauli_x().matmul(&pauli_y()).unwrap();
    assert_eq!(xy, I * pauli_z());
    let zz = pauli_z().matmul(&pauli_z()).unwrap();
    assert_eq!(zz, identity2());
}
