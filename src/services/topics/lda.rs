// Latent Dirichlet Allocation
// Batch variational Bayes over a (weighted) document-term matrix.
//
// Works directly on TF-IDF weights: the E-step only needs non-negative
// per-term mass, not integer counts.

use super::TopicError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const EPS: f64 = f64::EPSILON;

#[derive(Debug, Clone)]
pub struct LdaConfig {
    pub n_components: usize,
    pub max_iter: usize,
    pub max_doc_update_iter: usize,
    pub mean_change_tol: f64,
    pub seed: u64,
}

impl LdaConfig {
    pub fn new(n_components: usize) -> Self {
        Self {
            n_components,
            max_iter: 10,
            max_doc_update_iter: 100,
            mean_change_tol: 1e-3,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LdaModel {
    /// Topic-word variational parameters, `n_components x n_features`.
    pub components: Vec<Vec<f64>>,
}

impl LdaModel {
    /// Indices of the `n` heaviest features of `topic`, heaviest first.
    pub fn top_features(&self, topic: usize, n: usize) -> Vec<usize> {
        let Some(weights) = self.components.get(topic) else {
            return Vec::new();
        };
        let mut idx: Vec<usize> = (0..weights.len()).collect();
        idx.sort_by(|&a, &b| {
            weights[b]
                .partial_cmp(&weights[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        idx.truncate(n);
        idx
    }
}

/// Digamma via upward recurrence and the asymptotic series.
pub(crate) fn digamma(mut x: f64) -> f64 {
    let mut result = 0.0;
    while x < 6.0 {
        result -= 1.0 / x;
        x += 1.0;
    }
    let f = 1.0 / (x * x);
    result + x.ln()
        - 0.5 / x
        - f * (1.0 / 12.0 - f * (1.0 / 120.0 - f * (1.0 / 252.0 - f * (1.0 / 240.0 - f / 132.0))))
}

/// exp(E[log X]) for X ~ Dir(alpha), elementwise.
fn exp_dirichlet_expectation(alpha: &[f64]) -> Vec<f64> {
    let total = digamma(alpha.iter().sum::<f64>());
    alpha.iter().map(|a| (digamma(*a) - total).exp()).collect()
}

fn standard_normal(rng: &mut StdRng) -> f64 {
    // Box-Muller; 1 - u keeps the log argument in (0, 1].
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Marsaglia-Tsang sampler, valid for shape >= 1.
fn sample_gamma(rng: &mut StdRng, shape: f64, scale: f64) -> f64 {
    let d = shape - 1.0 / 3.0;
    let c = 1.0 / (9.0 * d).sqrt();
    loop {
        let x = standard_normal(rng);
        let v = (1.0 + c * x).powi(3);
        if v <= 0.0 {
            continue;
        }
        let u: f64 = 1.0 - rng.gen::<f64>();
        if u < 1.0 - 0.0331 * x.powi(4) || u.ln() < 0.5 * x * x + d * (1.0 - v + v.ln()) {
            return d * v * scale;
        }
    }
}

fn gamma_init(rng: &mut StdRng, len: usize) -> Vec<f64> {
    (0..len).map(|_| sample_gamma(rng, 100.0, 0.01)).collect()
}

struct DocTerms {
    ids: Vec<usize>,
    weights: Vec<f64>,
}

fn sparse_rows(matrix: &[Vec<f64>]) -> Vec<DocTerms> {
    matrix
        .iter()
        .map(|row| {
            let (ids, weights) = row
                .iter()
                .enumerate()
                .filter(|(_, w)| **w > 0.0)
                .map(|(i, w)| (i, *w))
                .unzip();
            DocTerms { ids, weights }
        })
        .collect()
}

fn norm_phi(theta: &[f64], beta: &[Vec<f64>], doc: &DocTerms) -> Vec<f64> {
    doc.ids
        .iter()
        .map(|&w| theta.iter().zip(beta).map(|(t, row)| t * row[w]).sum::<f64>() + EPS)
        .collect()
}

pub fn fit(matrix: &[Vec<f64>], config: &LdaConfig) -> Result<LdaModel, TopicError> {
    let k = config.n_components;
    if k == 0 {
        return Err(TopicError::InvalidTopicCount(k));
    }
    let n_features = matrix.first().map(Vec::len).unwrap_or(0);
    if n_features == 0 {
        return Err(TopicError::EmptyVocabulary);
    }

    let alpha = 1.0 / k as f64;
    let eta = 1.0 / k as f64;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let docs = sparse_rows(matrix);

    let mut lambda: Vec<Vec<f64>> = (0..k).map(|_| gamma_init(&mut rng, n_features)).collect();

    for _ in 0..config.max_iter {
        let exp_beta: Vec<Vec<f64>> = lambda.iter().map(|row| exp_dirichlet_expectation(row)).collect();
        let mut sstats = vec![vec![0.0f64; n_features]; k];

        for doc in &docs {
            let mut gamma = gamma_init(&mut rng, k);
            if doc.ids.is_empty() {
                continue;
            }
            let mut theta = exp_dirichlet_expectation(&gamma);

            for _ in 0..config.max_doc_update_iter {
                let last = gamma.clone();
                let phi = norm_phi(&theta, &exp_beta, doc);
                for t in 0..k {
                    let acc: f64 = doc
                        .ids
                        .iter()
                        .zip(&doc.weights)
                        .zip(&phi)
                        .map(|((&w, cnt), p)| cnt / p * exp_beta[t][w])
                        .sum();
                    gamma[t] = alpha + theta[t] * acc;
                }
                theta = exp_dirichlet_expectation(&gamma);

                let mean_change =
                    gamma.iter().zip(&last).map(|(a, b)| (a - b).abs()).sum::<f64>() / k as f64;
                if mean_change < config.mean_change_tol {
                    break;
                }
            }

            let phi = norm_phi(&theta, &exp_beta, doc);
            for t in 0..k {
                for ((&w, cnt), p) in doc.ids.iter().zip(&doc.weights).zip(&phi) {
                    sstats[t][w] += theta[t] * cnt / p;
                }
            }
        }

        for t in 0..k {
            for w in 0..n_features {
                lambda[t][w] = eta + sstats[t][w] * exp_beta[t][w];
            }
        }
    }

    Ok(LdaModel { components: lambda })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digamma_known_values() {
        // psi(1) = -gamma (Euler-Mascheroni)
        assert!((digamma(1.0) + 0.5772156649).abs() < 1e-8);
        // psi(0.5) = -gamma - 2 ln 2
        assert!((digamma(0.5) + 1.9635100260).abs() < 1e-8);
        assert!((digamma(10.0) - 2.2517525891).abs() < 1e-8);
    }

    #[test]
    fn test_gamma_samples_near_mean() {
        let mut rng = StdRng::seed_from_u64(7);
        let samples = gamma_init(&mut rng, 2000);
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        assert!((mean - 1.0).abs() < 0.02, "mean was {mean}");
        assert!(samples.iter().all(|s| *s > 0.0));
    }

    #[test]
    fn test_fit_is_reproducible() {
        let matrix = vec![
            vec![0.9, 0.4, 0.0, 0.0],
            vec![0.8, 0.6, 0.0, 0.0],
            vec![0.0, 0.0, 0.7, 0.7],
        ];
        let a = fit(&matrix, &LdaConfig::new(2)).unwrap();
        let b = fit(&matrix, &LdaConfig::new(2)).unwrap();
        assert_eq!(a.components, b.components);
        assert_eq!(a.components.len(), 2);
        assert_eq!(a.components[0].len(), 4);
    }

    #[test]
    fn test_single_topic_ranks_heaviest_terms() {
        let matrix = vec![vec![0.9, 0.1, 0.5], vec![0.8, 0.0, 0.4]];
        let model = fit(&matrix, &LdaConfig::new(1)).unwrap();
        assert_eq!(model.top_features(0, 2), vec![0, 2]);
        assert!(model.top_features(1, 2).is_empty());
    }

    #[test]
    fn test_zero_topics_rejected() {
        let err = fit(&[vec![1.0]], &LdaConfig::new(0)).unwrap_err();
        assert!(matches!(err, TopicError::InvalidTopicCount(0)));
    }
}
