use alloy::sol;

// ─── ERC-20 Token Interface (ownable + pausable) ────────────────────────────
sol! {
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    #[sol(rpc)]
    contract ERC20 {
        // === ERC-20 core events ===
        event Transfer(address indexed from, address indexed to, uint256 value);
        event Approval(address indexed owner, address indexed spender, uint256 value);

        // === Ownable / Pausable events ===
        event OwnershipTransferred(address indexed previousOwner, address indexed newOwner);
        event Paused(address account);
        event Unpaused(address account);

        // === ERC-20 view functions ===
        function name() external view returns (string memory);
        function symbol() external view returns (string memory);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);

        // === Ownable / Pausable view functions ===
        function owner() external view returns (address);
        function paused() external view returns (bool);

        // === ERC-20 mutating functions ===
        function transfer(address to, uint256 value) external returns (bool);
        function approve(address spender, uint256 value) external returns (bool);
        function transferFrom(address from, address to, uint256 value) external returns (bool);

        // === Admin functions ===
        function mint(address to, uint256 value) external;
        function burn(uint256 value) external;
        function pause() external;
        function unpause() external;
        function transferOwnership(address newOwner) external;
    }
}

// ─── Token Factory ──────────────────────────────────────────────────────────
sol! {
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    #[sol(rpc)]
    contract TokenFactory {
        event TokenCreated(
            address indexed token,
            address indexed creator,
            string name,
            string symbol,
            uint256 initialSupply
        );
        event TokenRegistered(address indexed token, address indexed registrar);

        function createToken(string name, string symbol, uint256 initialSupply)
            external
            returns (address token);
        function registerToken(address token, string name, string symbol) external;

        function getAllDeployedTokens() external view returns (address[] memory);
        function getTotalTokensDeployed() external view returns (uint256);
        function getTokenInfo(address token)
            external
            view
            returns (
                string memory name,
                string memory symbol,
                address creator,
                uint256 initialSupply,
                uint256 deployedAt
            );
    }
}
