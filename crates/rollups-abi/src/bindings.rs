#![allow(missing_docs)]

use alloy_sol_types::sol;

sol! {
    /// Inclusion proof argument of `validateOutput` / `executeOutput`.
    #[derive(Debug, PartialEq, Eq)]
    struct OutputValidityProof {
        uint64 outputIndex;
        bytes32[] outputHashesSiblings;
    }

    interface IApplication {
        function executeOutput(bytes calldata output, OutputValidityProof calldata proof) external;
        function validateOutput(bytes calldata output, OutputValidityProof calldata proof) external view;
        function wasOutputExecuted(uint256 outputIndex) external view returns (bool);

        error OutputNotExecutable(bytes output);
        error OutputNotReexecutable(bytes output);
        error InsufficientFunds(uint256 value, uint256 balance);
        error InvalidOutputHashesSiblingsArrayLength();
        error InvalidOutputsMerkleRoot(bytes32 outputsMerkleRoot);
    }

    /// Output encodings emitted by the rollup.
    interface Outputs {
        function Notice(bytes calldata payload) external;
        function Voucher(address destination, uint256 value, bytes calldata payload) external;
        function DelegateCallVoucher(address destination, bytes calldata payload) external;
    }

    interface IInputBox {
        function addInput(address appContract, bytes calldata payload) external returns (bytes32);
    }

    interface IEtherPortal {
        function depositEther(address appContract, bytes calldata execLayerData) external payable;
    }

    interface IERC20Portal {
        function depositERC20Tokens(address token, address appContract, uint256 value, bytes calldata execLayerData) external;
    }

    interface IERC721Portal {
        function depositERC721Token(address token, address appContract, uint256 tokenId, bytes calldata baseLayerData, bytes calldata execLayerData) external;
    }

    interface IERC1155SinglePortal {
        function depositSingleERC1155Token(address token, address appContract, uint256 tokenId, uint256 value, bytes calldata baseLayerData, bytes calldata execLayerData) external;
    }

    interface IERC1155BatchPortal {
        function depositBatchERC1155Token(address token, address appContract, uint256[] calldata tokenIds, uint256[] calldata values, bytes calldata baseLayerData, bytes calldata execLayerData) external;
    }

    interface IERC20 {
        function transfer(address to, uint256 amount) external returns (bool);
        function approve(address spender, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
    }

    interface IERC721 {
        function safeTransferFrom(address from, address to, uint256 tokenId) external;
        function approve(address to, uint256 tokenId) external;
        function getApproved(uint256 tokenId) external view returns (address);
    }

    /// `mint(address,string)` as exposed by URI-storage collections.
    interface IERC721UriMint {
        function mint(address to, string calldata uri) external;
    }

    interface IERC721Mint {
        function mint(address to) external;
        function mintTo(address to) external;
    }

    interface IERC1155 {
        function safeTransferFrom(address from, address to, uint256 id, uint256 value, bytes calldata data) external;
        function safeBatchTransferFrom(address from, address to, uint256[] calldata ids, uint256[] calldata values, bytes calldata data) external;
        function isApprovedForAll(address account, address operator) external view returns (bool);
        function setApprovalForAll(address operator, bool approved) external;
    }
}

impl From<&rollups_types::OutputProof> for OutputValidityProof {
    fn from(proof: &rollups_types::OutputProof) -> Self {
        Self {
            outputIndex: proof.output_index,
            outputHashesSiblings: proof.output_hashes_siblings.clone(),
        }
    }
}
