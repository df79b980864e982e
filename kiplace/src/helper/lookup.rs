use super::PlacementHelper;
use crate::board::{Board, Footprint};
use crate::core::KiplaceError;
use crate::wildcard::Wildcard;

impl<B: Board> PlacementHelper<B> {
    /// Reference designators of every footprint, in host order.
    pub fn get_all_component_names(&self) -> Result<Vec<String>, KiplaceError> {
        Ok(self
            .board()?
            .footprints()
            .iter()
            .map(|fp| fp.reference.clone())
            .collect())
    }

    /// Names matching a shell-style wildcard. Matches against `all_names`
    /// when given, otherwise against the board.
    pub fn get_wildcard_component_names(
        &self,
        pattern: &str,
        all_names: Option<&[String]>,
    ) -> Result<Vec<String>, KiplaceError> {
        let wildcard = Wildcard::new(pattern)?;
        match all_names {
            Some(names) => Ok(wildcard.filter(names)),
            None => Ok(wildcard.filter(&self.get_all_component_names()?)),
        }
    }

    /// First footprint whose reference equals `name`.
    pub fn get_component(&self, name: &str) -> Result<&Footprint, KiplaceError> {
        let index = self.component_index(name)?;
        Ok(&self.board()?.footprints()[index])
    }

    pub(crate) fn component_index(&self, name: &str) -> Result<usize, KiplaceError> {
        self.board()?
            .footprints()
            .iter()
            .position(|fp| fp.reference == name)
            .ok_or_else(|| KiplaceError::NotFound(name.to_string()))
    }

    pub(crate) fn component_mut(&mut self, name: &str) -> Result<&mut Footprint, KiplaceError> {
        let index = self.component_index(name)?;
        Ok(&mut self.board_mut()?.footprints_mut()[index])
    }
}
