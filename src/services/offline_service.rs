use crate::models::bank::{self, BankQuestion};
use crate::models::question::{Question, QuestionSource};
use chrono::Utc;
use rand::seq::SliceRandom;

#[derive(Debug)]
pub struct OfflineSelection {
    pub questions: Vec<Question>,
    pub warning: Option<String>,
}

/// Selects up to `count` bank questions, widening the candidate pool
/// (subject+objective → subject → all subjects) until enough are available,
/// then returns a shuffled, re-keyed subset.
pub fn select(subject: Option<&str>, objective: Option<&str>, count: usize) -> OfflineSelection {
    let all = bank::question_bank();

    let subject_pool: Vec<&BankQuestion> = match subject {
        Some(s) => all
            .iter()
            .filter(|q| q.subject.eq_ignore_ascii_case(s.trim()))
            .collect(),
        None => all.iter().collect(),
    };

    let mut pool: Vec<&BankQuestion> = match objective {
        Some(obj) => subject_pool
            .iter()
            .copied()
            .filter(|q| matches_objective(q, obj))
            .collect(),
        None => subject_pool.clone(),
    };

    let mut notes: Vec<String> = Vec::new();

    if pool.len() < count && pool.len() < subject_pool.len() {
        let narrowed = pool.len();
        widen(&mut pool, &subject_pool);
        notes.push(format!(
            "only {} questions matched the requested objective; widened to the whole subject",
            narrowed
        ));
    }

    if pool.len() < count && pool.len() < all.len() {
        let everything: Vec<&BankQuestion> = all.iter().collect();
        widen(&mut pool, &everything);
        notes.push("widened selection across all subjects to cover the request".to_string());
    }

    if pool.len() < count {
        notes.push(format!(
            "requested {} questions but only {} are available in the local bank",
            count,
            pool.len()
        ));
    }

    let mut rng = rand::thread_rng();
    pool.shuffle(&mut rng);
    pool.truncate(count);

    // Re-key so repeated selections of the same underlying content stay
    // distinguishable to callers tracking usage by id.
    let stamp = Utc::now().timestamp_millis();
    let questions = pool
        .into_iter()
        .map(|q| Question {
            id: format!("{}-{}", q.id, stamp),
            text: q.text.clone(),
            options: q.options.clone(),
            correct_option: q.correct_option,
            explanation: q.explanation.clone(),
            subject: q.subject.clone(),
            objective: Some(q.objective.clone()),
            difficulty_level: q.difficulty_level,
            source: QuestionSource::LocalBank,
        })
        .collect();

    let warning = (!notes.is_empty()).then(|| notes.join("; "));
    OfflineSelection { questions, warning }
}

fn matches_objective(question: &BankQuestion, objective: &str) -> bool {
    let needle = objective.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    let haystack_meta = question.objective.to_lowercase();
    let haystack_text = question.text.to_lowercase();
    if haystack_meta.contains(&needle) || haystack_text.contains(&needle) {
        return true;
    }
    // Keyword match: any substantial objective word appearing in the record.
    needle
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 3)
        .any(|word| haystack_meta.contains(word) || haystack_text.contains(word))
}

fn widen<'a>(pool: &mut Vec<&'a BankQuestion>, wider: &[&'a BankQuestion]) {
    for candidate in wider {
        if !pool.iter().any(|q| q.id == candidate.id) {
            pool.push(candidate);
        }
    }
}
