use crate::domain::Participant;

/// A named prize with a target number of winners.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrizeEntry {
    pub name: String,
    pub quantity: usize,
    /// Winners in selection order.
    pub winners: Vec<Participant>,
}

impl PrizeEntry {
    pub fn remaining_slots(&self) -> usize {
        self.quantity.saturating_sub(self.winners.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("no prize entry at index {0}")]
    NoSuchEntry(usize),
    #[error("prize entry {0} has no remaining slots")]
    Full(usize),
}

/// Ordered prize entries and the winners assigned to each.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrizeLedger {
    entries: Vec<PrizeEntry>,
}

impl PrizeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry(&mut self, name: impl Into<String>, quantity: usize) {
        self.entries.push(PrizeEntry {
            name: name.into(),
            quantity,
            winners: Vec::new(),
        });
    }

    pub fn record_winner(&mut self, index: usize, winner: Participant) -> Result<(), LedgerError> {
        let entry = self
            .entries
            .get_mut(index)
            .ok_or(LedgerError::NoSuchEntry(index))?;
        if entry.remaining_slots() == 0 {
            return Err(LedgerError::Full(index));
        }
        entry.winners.push(winner);
        Ok(())
    }

    pub fn remaining_slots(&self, index: usize) -> usize {
        self.entries
            .get(index)
            .map(PrizeEntry::remaining_slots)
            .unwrap_or(0)
    }

    pub fn entries(&self) -> &[PrizeEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&PrizeEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
