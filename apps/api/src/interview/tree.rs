//! Question tree: a parent/child view over one interview's questions.
//!
//! Positions are insertion order (ascending question id). All walks are
//! iterative so deep follow-up chains cannot exhaust the stack.

use std::collections::{HashMap, HashSet};

use crate::ai_gateway::wire::QaPair;
use crate::models::interview::{Question, UserAnswer};

pub struct QuestionTree<'a> {
    ordered: Vec<&'a Question>,
    position: HashMap<i64, usize>,
    children: HashMap<i64, Vec<i64>>,
}

impl<'a> QuestionTree<'a> {
    pub fn new(questions: &'a [Question]) -> Self {
        let mut ordered: Vec<&Question> = questions.iter().collect();
        ordered.sort_by_key(|q| q.id);

        let position = ordered
            .iter()
            .enumerate()
            .map(|(idx, q)| (q.id, idx))
            .collect();

        let mut children: HashMap<i64, Vec<i64>> = HashMap::new();
        for q in &ordered {
            if let Some(parent) = q.parent_question_id {
                children.entry(parent).or_default().push(q.id);
            }
        }

        Self {
            ordered,
            position,
            children,
        }
    }

    pub fn get(&self, question_id: i64) -> Option<&'a Question> {
        self.position
            .get(&question_id)
            .map(|&idx| self.ordered[idx])
    }

    /// First parentless question strictly after `question_id`'s position.
    pub fn next_root_after(&self, question_id: i64) -> Option<&'a Question> {
        let start = *self.position.get(&question_id)?;
        self.ordered[start + 1..].iter().copied().find(|q| q.is_root())
    }

    /// The root of the branch containing `question_id`.
    pub fn root_of(&self, question_id: i64) -> Option<&'a Question> {
        let mut current = self.get(question_id)?;
        // A well-formed tree never revisits a node; the step bound guards
        // against a corrupt parent cycle.
        for _ in 0..self.ordered.len() {
            match current.parent_question_id.and_then(|p| self.get(p)) {
                Some(parent) => current = parent,
                None => return Some(current),
            }
        }
        None
    }

    /// Every transitive follow-up of `question_id`, in insertion order.
    /// The question itself is not included.
    pub fn descendants_of(&self, question_id: i64) -> Vec<i64> {
        let mut seen: HashSet<i64> = HashSet::new();
        let mut worklist: Vec<i64> = vec![question_id];

        while let Some(id) = worklist.pop() {
            if let Some(kids) = self.children.get(&id) {
                for &child in kids {
                    if child != question_id && seen.insert(child) {
                        worklist.push(child);
                    }
                }
            }
        }

        let mut descendants: Vec<i64> = seen.into_iter().collect();
        descendants.sort_by_key(|id| self.position.get(id).copied().unwrap_or(usize::MAX));
        descendants
    }
}

/// The question/answer pair sent as `previous_qa` for a follow-up request:
/// only the immediate pair, not the whole interview.
pub fn branch_context(question: &Question, answer: &UserAnswer) -> Vec<QaPair> {
    vec![QaPair {
        question: question.question_text.clone(),
        answer: answer.answer_text.clone(),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::interview::DifficultyLevel;

    fn q(id: i64, parent: Option<i64>) -> Question {
        Question {
            id,
            interview_id: 1,
            parent_question_id: parent,
            question_text: format!("q{id}"),
            difficulty_level: DifficultyLevel::Junior,
            question_mark: 5.0,
        }
    }

    #[test]
    fn test_next_root_skips_follow_ups() {
        // roots 1, 2, 5 with follow-ups 3 (of 1) and 4 (of 3)
        let questions = vec![q(1, None), q(2, None), q(3, Some(1)), q(4, Some(3)), q(5, None)];
        let tree = QuestionTree::new(&questions);
        assert_eq!(tree.next_root_after(1).map(|q| q.id), Some(2));
        assert_eq!(tree.next_root_after(2).map(|q| q.id), Some(5));
        assert_eq!(tree.next_root_after(3).map(|q| q.id), Some(5));
        assert_eq!(tree.next_root_after(5).map(|q| q.id), None);
        assert!(tree.next_root_after(99).is_none());
    }

    #[test]
    fn test_next_root_uses_id_order_not_slice_order() {
        let questions = vec![q(3, None), q(1, None), q(2, Some(1))];
        let tree = QuestionTree::new(&questions);
        assert_eq!(tree.next_root_after(1).map(|q| q.id), Some(3));
    }

    #[test]
    fn test_descendants_of_chain() {
        let questions = vec![q(1, None), q(2, Some(1)), q(3, Some(2)), q(4, Some(3)), q(5, None)];
        let tree = QuestionTree::new(&questions);
        assert_eq!(tree.descendants_of(1), vec![2, 3, 4]);
        assert_eq!(tree.descendants_of(3), vec![4]);
        assert!(tree.descendants_of(5).is_empty());
    }

    #[test]
    fn test_descendants_of_fan_out() {
        let questions = vec![
            q(1, None),
            q(2, Some(1)),
            q(3, Some(1)),
            q(4, Some(2)),
            q(5, Some(9)),
        ];
        let tree = QuestionTree::new(&questions);
        assert_eq!(tree.descendants_of(1), vec![2, 3, 4]);
    }

    #[test]
    fn test_deep_chain_does_not_recurse() {
        let mut questions = vec![q(1, None)];
        for id in 2..=20_000 {
            questions.push(q(id, Some(id - 1)));
        }
        let tree = QuestionTree::new(&questions);
        assert_eq!(tree.descendants_of(1).len(), 19_999);
        assert_eq!(tree.root_of(20_000).map(|q| q.id), Some(1));
    }

    #[test]
    fn test_root_of_survives_cycle() {
        let questions = vec![q(1, Some(2)), q(2, Some(1))];
        let tree = QuestionTree::new(&questions);
        assert!(tree.root_of(1).is_none());
        assert_eq!(tree.descendants_of(1), vec![2]);
    }
}
