// src/docs.rs

use crate::handlers;
use crate::models;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Produtos ---
        handlers::produto::produto_info,
        handlers::produto::produto_com_estoque,
        handlers::produto::atualizar_produto,
        handlers::produto::cadastrar_produto,

        // --- Clientes ---
        handlers::cliente::saldo_convenio,

        // --- Transferências ---
        handlers::transfer::receber_solicitacao,
        handlers::transfer::receber_resposta,
        handlers::transfer::receber_transferencia,
    ),
    components(
        schemas(
            // --- Produtos ---
            models::produto::Produto,
            models::produto::ListaProdutos,

            // --- Clientes ---
            models::cliente::SaldoConvenio,
            handlers::cliente::ConvenioPayload,

            // --- Transferências ---
            models::transfer::TransferStatus,
            models::transfer::TransferRequest,
            models::transfer::TransferResponse,
            models::transfer::TransferPayload,
            models::transfer::AtualizarProdutoPayload,
            models::transfer::CadastroProdutoPayload,
            models::transfer::PendingTransfer,
            models::transfer::TransferOutcome,
        )
    ),
    tags(
        (name = "Produtos", description = "Consulta e atualização de estoque entre lojas"),
        (name = "Clientes", description = "Saldo de convênio"),
        (name = "Transferências", description = "Pedido, resposta e entrada de estoque transferido")
    )
)]
pub struct ApiDoc;
