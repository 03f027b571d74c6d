/// Genome representation for the forecasting genes
///
/// A genome is the ordered list of indicator catalog indices a gene blends.
/// Duplicates are allowed: an index appearing twice simply counts twice in
/// the weighted mean.
///
/// Genetic operators work on this flat form, so crossover and mutation never
/// need to know what an indicator is:
/// - **Crossover**: per-locus swaps between two parents
/// - **Mutation**: redraw individual loci from the catalog
///
/// # Example
///
/// ```
/// let genome: evoforecast::engines::generation::Genome = vec![3, 0, 7];
/// // blends indicators 3, 0 and 7 with unit weights
/// assert_eq!(genome.len(), 3);
/// ```
pub type Genome = Vec<usize>;
