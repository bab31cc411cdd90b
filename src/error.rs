use thiserror::Error;

/// Everything that can go wrong while handling one inbound line.
///
/// The `Display` text is what the offending user sees after `SISTEMA: `.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("Você não pode desafiar a si mesmo.")]
    SelfChallenge,
    #[error("Usuário {0} não encontrado.")]
    TargetNotFound(String),
    #[error("Nenhum desafio pendente para aceitar.")]
    NoPendingChallenge,
    #[error("Não é sua vez.")]
    NotYourTurn,
    #[error("Jogada fora do tabuleiro: linha e coluna vão de 0 a 2.")]
    OutOfRange,
    #[error("Essa casa já está ocupada.")]
    CellOccupied,
    #[error("Comando inválido. Uso: {0}")]
    MalformedCommand(&'static str),
    #[error("Você não está em nenhuma partida.")]
    NoActiveGame,
    #[error("{0} já está em uma partida.")]
    PlayerBusy(String),
    #[error("Falha ao entregar mensagem para a conexão.")]
    DeliveryFailure,
}
