//! Alignment of one pattern against one sentence.
//!
//! The search places anchored elements (non-floating constants, optional
//! constants and variable slots) in dictionary order with a depth-first walk
//! over the candidate token positions. Each complete anchored assignment is
//! then finished: trailing variables absorb the tokens after the last anchor,
//! floating groups are placed near the span, the lead verb is looked up, and
//! the result is scored. The best-scoring alignment wins; on ties the first
//! one found is kept.
//!
//! A token is consumed by at most one element per attempt. The walk is
//! bounded by `max_alignment_steps` visited nodes.

use bit_set::BitSet;
use log::debug;

use crate::config::MatcherConfig;
use crate::idiom_detection::models::{
    Alternative, ConstantGroup, Element, ElementMatch, Match, MatchedKind, PatternRecord,
    TokenSpan, VariableClass, VariableSlot,
};
use crate::idiom_detection::query::Query;

/// Try to align a pattern with the query, returning its best alignment.
pub fn attempt_match<'p>(
    pattern: &'p PatternRecord,
    query: &Query,
    config: &MatcherConfig,
) -> Option<Match<'p>> {
    let anchored: Vec<usize> = pattern
        .elements
        .iter()
        .enumerate()
        .filter(|(_, element)| !element.is_floating())
        .map(|(index, _)| index)
        .collect();

    let mut search = Search {
        pattern,
        query,
        config,
        anchored,
        steps: 0,
        exhausted: false,
        best: None,
    };
    search.explore(0, State::new());

    if search.exhausted {
        debug!(
            "Pattern {} hit the alignment step budget ({})",
            pattern.id, config.max_alignment_steps
        );
    }

    search.best.map(|best| {
        let mut elements = best.placements;
        elements.sort_by_key(|placement| placement.element);
        Match {
            pattern,
            score: best.score,
            elements,
            lead_verb: best.lead_verb,
            span: best.span,
        }
    })
}

/// Partial alignment carried down the search.
#[derive(Debug, Clone)]
struct State {
    placements: Vec<ElementMatch>,
    used: BitSet,
    /// Last token consumed by an anchored constant.
    last: Option<usize>,
    /// Variable slots waiting for the next anchor to bound them.
    pending: Vec<usize>,
}

impl State {
    fn new() -> Self {
        Self {
            placements: Vec::new(),
            used: BitSet::new(),
            last: None,
            pending: Vec::new(),
        }
    }

    fn consume(&mut self, element: usize, kind: MatchedKind, positions: Vec<usize>) {
        for &position in &positions {
            self.used.insert(position);
        }
        self.placements.push(ElementMatch {
            element,
            kind,
            positions,
        });
    }

    fn span(&self) -> Option<TokenSpan> {
        let positions = self.placements.iter().flat_map(|p| p.positions.iter().copied());
        let (start, end) = positions.fold(None, |acc: Option<(usize, usize)>, position| {
            Some(match acc {
                Some((start, end)) => (start.min(position), end.max(position)),
                None => (position, position),
            })
        })?;
        Some(TokenSpan {
            start,
            end: end + 1,
        })
    }
}

#[derive(Debug)]
struct Alignment {
    score: f64,
    placements: Vec<ElementMatch>,
    lead_verb: Option<usize>,
    span: TokenSpan,
}

struct Search<'a> {
    pattern: &'a PatternRecord,
    query: &'a Query,
    config: &'a MatcherConfig,
    /// Element indices placed in dictionary order.
    anchored: Vec<usize>,
    steps: usize,
    exhausted: bool,
    best: Option<Alignment>,
}

impl Search<'_> {
    fn explore(&mut self, cursor: usize, mut state: State) {
        if self.steps >= self.config.max_alignment_steps {
            self.exhausted = true;
            return;
        }
        self.steps += 1;

        let Some(&element_index) = self.anchored.get(cursor) else {
            self.finish(state);
            return;
        };

        let pattern = self.pattern;
        match &pattern.elements[element_index] {
            Element::Variable(_) => {
                state.pending.push(element_index);
                self.explore(cursor + 1, state);
            }
            Element::Constant(group) => {
                self.place_anchored(cursor, element_index, group, MatchedKind::Constant, &state);
            }
            Element::Optional(group) => {
                self.place_anchored(cursor, element_index, group, MatchedKind::Optional, &state);
                self.explore(cursor + 1, state);
            }
        }
    }

    fn place_anchored(
        &mut self,
        cursor: usize,
        element: usize,
        group: &ConstantGroup,
        kind: MatchedKind,
        state: &State,
    ) {
        for alternative in &group.alternatives {
            for start in self.query.occurrences(&alternative.terms[0]) {
                if self.exhausted {
                    return;
                }
                if state.used.contains(start) || state.last.is_some_and(|last| start <= last) {
                    continue;
                }
                let Some(mut next) = self.bridge(state, start) else {
                    continue;
                };
                let Some(positions) = self.follow(alternative, start, &next.used) else {
                    continue;
                };

                next.last = positions.last().copied();
                next.consume(element, kind, positions);
                self.explore(cursor + 1, next);
            }
        }
    }

    /// Connect the next anchored word at `start` to the partial alignment.
    ///
    /// Pending variables absorb the tokens in between; without pending
    /// variables the gap must not exceed `max_gap`.
    fn bridge(&self, state: &State, start: usize) -> Option<State> {
        let mut next = state.clone();
        next.pending.clear();

        match state.last {
            Some(last) if state.pending.is_empty() => {
                (start - last - 1 <= self.config.max_gap).then_some(next)
            }
            Some(last) => {
                let assigned = self.absorb_interior(&state.pending, last + 1, start)?;
                for (element, positions) in assigned {
                    next.consume(element, MatchedKind::Variable, positions);
                }
                Some(next)
            }
            None => {
                let assigned = self.absorb_leading(&state.pending, start, &state.used)?;
                for (element, positions) in assigned {
                    next.consume(element, MatchedKind::Variable, positions);
                }
                Some(next)
            }
        }
    }

    /// Place the remaining words of an alternative after its first word.
    fn follow(&self, alternative: &Alternative, start: usize, used: &BitSet) -> Option<Vec<usize>> {
        let mut positions = Vec::with_capacity(alternative.len());
        positions.push(start);
        let mut previous = start;

        for term in &alternative.terms[1..] {
            let limit = (previous + 2 + self.config.max_gap).min(self.query.len());
            let found = (previous + 1..limit)
                .find(|&p| !used.contains(p) && self.query.token_matches(p, term))?;
            positions.push(found);
            previous = found;
        }

        Some(positions)
    }

    fn slot(&self, element: usize) -> &VariableSlot {
        match &self.pattern.elements[element] {
            Element::Variable(slot) => slot,
            _ => unreachable!("pending elements are variables"),
        }
    }

    fn is_head(&self, class: VariableClass, position: usize) -> bool {
        class.accepts_head(self.query.tokens[position].pos)
    }

    fn is_punctuation(&self, position: usize) -> bool {
        self.query.tokens[position].pos.is_punctuation()
    }

    /// Split the tokens in `from..to` between the pending slots.
    ///
    /// Every slot but the last takes tokens up to and including its first
    /// head; the last slot takes the rest. Slots never cross punctuation.
    fn absorb_interior(
        &self,
        pending: &[usize],
        from: usize,
        to: usize,
    ) -> Option<Vec<(usize, Vec<usize>)>> {
        let max_tokens = self.config.max_variable_tokens;
        let crosses_punctuation = (from..to).any(|p| self.is_punctuation(p));
        let mut assigned = Vec::new();
        let mut cursor = from;

        for (k, &element) in pending.iter().enumerate() {
            let slot = self.slot(element);
            let is_last = k + 1 == pending.len();

            let run = if crosses_punctuation {
                None
            } else if is_last {
                let len = to - cursor;
                (len > 0 && len <= max_tokens && (cursor..to).any(|p| self.is_head(slot.class, p)))
                    .then(|| (cursor..to).collect::<Vec<_>>())
            } else {
                let limit = (cursor + max_tokens).min(to);
                (cursor..limit)
                    .find(|&p| self.is_head(slot.class, p))
                    .map(|head| (cursor..=head).collect::<Vec<_>>())
            };

            match run {
                Some(positions) => {
                    cursor = positions.last().map_or(cursor, |&p| p + 1);
                    assigned.push((element, positions));
                }
                None if slot.optional => {}
                None => return None,
            }
        }

        // Tokens no slot took count as an ordinary gap.
        (to - cursor <= self.config.max_gap).then_some(assigned)
    }

    /// Fill slots that precede the first anchor from the tokens right before it.
    fn absorb_leading(
        &self,
        pending: &[usize],
        anchor: usize,
        used: &BitSet,
    ) -> Option<Vec<(usize, Vec<usize>)>> {
        let mut assigned = Vec::new();
        let mut boundary = anchor;

        for &element in pending.iter().rev() {
            let slot = self.slot(element);
            let mut run = Vec::new();
            let mut position = boundary;
            while position > 0 && run.len() < self.slot_width(slot) {
                let candidate = position - 1;
                if used.contains(candidate)
                    || !slot.class.accepts(self.query.tokens[candidate].pos)
                {
                    break;
                }
                run.push(candidate);
                position = candidate;
            }
            run.reverse();

            if run.iter().any(|&p| self.is_head(slot.class, p)) {
                boundary = run[0];
                assigned.push((element, run));
            } else if !slot.optional {
                return None;
            }
        }

        Some(assigned)
    }

    /// Fill slots that follow the last anchor from the tokens right after it.
    fn absorb_trailing(
        &self,
        pending: &[usize],
        after: usize,
        used: &BitSet,
    ) -> Option<Vec<(usize, Vec<usize>)>> {
        let mut assigned = Vec::new();
        let mut boundary = after;

        for &element in pending {
            let slot = self.slot(element);
            let mut run = Vec::new();
            let mut position = boundary;
            while position < self.query.len() && run.len() < self.slot_width(slot) {
                if used.contains(position)
                    || !slot.class.accepts(self.query.tokens[position].pos)
                {
                    break;
                }
                run.push(position);
                position += 1;
            }

            // Trailing modifiers without a head after them stay outside the slot.
            match run.iter().rposition(|&p| self.is_head(slot.class, p)) {
                Some(last_head) => {
                    run.truncate(last_head + 1);
                    boundary = run[last_head] + 1;
                    assigned.push((element, run));
                }
                None if slot.optional => {}
                None => return None,
            }
        }

        Some(assigned)
    }

    fn slot_width(&self, slot: &VariableSlot) -> usize {
        match slot.class {
            VariableClass::Any => 1,
            _ => self.config.max_variable_tokens,
        }
    }

    /// Complete an anchored assignment and keep it if it beats the best so far.
    fn finish(&mut self, mut state: State) {
        let floating: Vec<usize> = self
            .pattern
            .elements
            .iter()
            .enumerate()
            .filter(|(_, element)| element.is_floating())
            .map(|(index, _)| index)
            .collect();
        let first_floating = floating.first().copied().unwrap_or(usize::MAX);

        if let Some(last) = state.last {
            let pending = std::mem::take(&mut state.pending);
            let Some(assigned) = self.absorb_trailing(&pending, last + 1, &state.used) else {
                return;
            };
            for (element, positions) in assigned {
                state.consume(element, MatchedKind::Variable, positions);
            }
        }

        let pattern = self.pattern;
        for element in floating {
            let (group, kind) = match &pattern.elements[element] {
                Element::Constant(group) => (group, MatchedKind::Constant),
                Element::Optional(group) => (group, MatchedKind::Optional),
                Element::Variable(_) => continue,
            };
            match self.place_floating(group, &state) {
                Some(positions) => state.consume(element, kind, positions),
                None if kind == MatchedKind::Optional => {}
                None => return,
            }
        }

        // Nothing was anchored: slots listed before the first floating group
        // take the tokens right before the floating span, the rest follow it.
        if !state.pending.is_empty() {
            let Some(span) = state.span() else {
                return;
            };
            let pending = std::mem::take(&mut state.pending);
            let (leading, trailing): (Vec<usize>, Vec<usize>) = pending
                .into_iter()
                .partition(|&element| element < first_floating);
            let Some(before) = self.absorb_leading(&leading, span.start, &state.used) else {
                return;
            };
            let Some(after) = self.absorb_trailing(&trailing, span.end, &state.used) else {
                return;
            };
            for (element, positions) in before.into_iter().chain(after) {
                state.consume(element, MatchedKind::Variable, positions);
            }
        }

        let Some(span) = state.span() else {
            return;
        };

        let lead_verb = self.find_lead_verb(span);
        if lead_verb.is_none()
            && self
                .pattern
                .lead_verbs
                .as_ref()
                .is_some_and(|lead| lead.mandatory)
        {
            return;
        }

        let score = self.score(&state, span, lead_verb.is_some());
        if self.best.as_ref().is_none_or(|best| score > best.score) {
            self.best = Some(Alignment {
                score,
                placements: state.placements,
                lead_verb,
                span,
            });
        }
    }

    /// Nearest unused occurrence of a floating group within `max_gap` of the span.
    fn place_floating(&self, group: &ConstantGroup, state: &State) -> Option<Vec<usize>> {
        let span = state.span();
        let mut best: Option<(usize, Vec<usize>)> = None;

        for alternative in &group.alternatives {
            for start in self.query.occurrences(&alternative.terms[0]) {
                if state.used.contains(start) {
                    continue;
                }
                let Some(positions) = self.follow(alternative, start, &state.used) else {
                    continue;
                };
                let first = positions[0];
                let last = positions[positions.len() - 1];

                let distance = match span {
                    None => 0,
                    Some(span) if last < span.start => span.start - last - 1,
                    Some(span) if first >= span.end => first - span.end,
                    Some(_) => 0,
                };
                if distance > self.config.max_gap {
                    continue;
                }
                if best.as_ref().is_none_or(|(d, p)| (distance, first) < (*d, p[0])) {
                    best = Some((distance, positions));
                }
            }
        }

        best.map(|(_, positions)| positions)
    }

    /// Scan back from the span start for a lead verb, stopping at punctuation.
    fn find_lead_verb(&self, span: TokenSpan) -> Option<usize> {
        let lead = self.pattern.lead_verbs.as_ref()?;
        let window_start = span.start.saturating_sub(self.config.lead_verb_window);

        (window_start..span.start)
            .rev()
            .take_while(|&p| !self.is_punctuation(p))
            .find(|&p| {
                let token = &self.query.tokens[p];
                lead.matches(&token.lemma) || lead.matches(&token.norm)
            })
    }

    fn score(&self, state: &State, span: TokenSpan, has_lead_verb: bool) -> f64 {
        let weights = &self.config.scoring;
        let mut score = 0.0;
        let mut consumed = 0;

        for placement in &state.placements {
            consumed += placement.positions.len();
            let words = placement.positions.len() as f64;
            score += match placement.kind {
                MatchedKind::Constant => weights.required_word * words,
                MatchedKind::Optional => weights.optional_word * words,
                MatchedKind::Variable => 0.0,
            };
        }

        if has_lead_verb {
            score += weights.lead_verb_bonus;
        }

        let unconsumed = span.len() - consumed;
        score - weights.dispersion_penalty * unconsumed as f64
    }
}
